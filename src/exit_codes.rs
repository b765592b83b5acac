//! Exit codes for the CLI tool.

/// All files processed (changed or not), or `--check` passed
pub const SUCCESS: i32 = 0;
/// At least one file could not be opened or saved
pub const FILE_FAILED: i32 = 1;
/// Nothing was processed: bad expression, no input files, failed check
pub const FATAL_ERROR: i32 = 2;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FileFailed,
    FatalError,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FileFailed => FILE_FAILED,
            Self::FatalError => FATAL_ERROR,
        }
    }
}
