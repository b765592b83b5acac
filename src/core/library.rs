//! Input discovery: explicit paths, or the default `*.mp3` glob.

use std::path::PathBuf;

use glob::MatchOptions;
use thiserror::Error;
use tracing::warn;

/// Pattern used when no paths are given on the command line.
pub const DEFAULT_PATTERN: &str = "*.mp3";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no files match `{0}`")]
    NoMatch(String),
}

/// Explicit paths are used as given (order kept, nothing checked yet: a
/// missing file is a per-file failure later). With none, expand
/// [`DEFAULT_PATTERN`] in the current directory.
pub fn resolve_inputs(files: Vec<PathBuf>) -> Result<Vec<PathBuf>, InputError> {
    if !files.is_empty() {
        return Ok(files);
    }
    expand(DEFAULT_PATTERN)
}

/// Expand a glob into regular files, sorted. No match is an error.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, InputError> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let entries = glob::glob_with(pattern, options).map_err(|source| InputError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => out.push(path),
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable entry: {e}"),
        }
    }

    if out.is_empty() {
        return Err(InputError::NoMatch(pattern.to_string()));
    }

    out.sort();
    Ok(out)
}
