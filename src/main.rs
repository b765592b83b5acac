//! retag
//!
//! # What this program is
//! A small command-line tool that batch-edits the ID3 text fields of MP3
//! files (title, artist, album, genre, track, comment, year). For each field
//! you give one or more tiny expressions; every file's current value is run
//! through them and the result is written back if it changed.
//!
//! ```text
//! retag -T 's/^/Podcast: / unless /^Podcast: /' -a 'Some Show' --ascii *.mp3
//! ```
//!
//! # How a run works (super simple mental model)
//! - Parse flags. Every field flag becomes a *fragment*, kept in the order it
//!   appeared on the command line.
//! - Compile each field's fragments into one editor. Any bad expression stops
//!   the run here, before a single file is opened.
//! - For each file, one after another: open, run the seven editors, print a
//!   before/after block per changed field, save once, close.
//!
//! # Expressions
//! `$_` is the field's value and the only thing an expression can change.
//! Read-only: `$file`, `$length` (`M:SS`), `$seconds`. Statements:
//! `s/pat/repl/gimsx`, `$_ = ...`, `$_ .= ...`, `last`, each optionally
//! followed by `if COND` / `unless COND`. See `core::script`.
//!
//! # Exit status
//! 0 when every file opened, 1 when at least one did not, 2 when nothing could
//! run at all.

mod cli;
mod core;
mod exit_codes;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::core::apply::process_files;
use crate::core::check::check_dependencies;
use crate::core::library::resolve_inputs;
use crate::core::report::Reporter;
use crate::core::script::Registry;
use crate::core::tags::Id3Backend;
use crate::core::types::RunOptions;
use exit_codes::ExitCode;

fn main() {
    let (cli, registry) = match cli::parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => e.exit(),
    };

    init_tracing(cli.debug);

    std::process::exit(run(cli, registry).code());
}

/// `--debug` wins; otherwise `RUST_LOG`, otherwise warnings only.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("retag=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli, registry: Registry) -> ExitCode {
    let editors = match registry.compile() {
        Ok(editors) => editors,
        Err(e) => {
            eprintln!("retag: {e}");
            return ExitCode::FatalError;
        }
    };

    if cli.check {
        return match check_dependencies() {
            Ok(()) => {
                if !cli.quiet {
                    println!("retag: dependencies ok");
                }
                ExitCode::Success
            }
            Err(e) => {
                eprintln!("retag: {e}");
                ExitCode::FatalError
            }
        };
    }

    if editors.iter().all(|e| e.is_identity()) && !cli.update_length {
        warn!("no edits given; files will only be reported");
    }

    let paths = match resolve_inputs(cli.files) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("retag: {e}");
            return ExitCode::FatalError;
        }
    };

    let opts = RunOptions {
        dry_run: cli.dry_run,
        quiet: cli.quiet,
        update_length: cli.update_length,
    };

    let mut reporter = Reporter::console(opts.quiet);
    let summary = process_files(&Id3Backend, &editors, &paths, opts, &mut reporter);

    if summary.has_failures() {
        ExitCode::FileFailed
    } else {
        ExitCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> ExitCode {
        let (cli, registry) =
            cli::parse_args(std::iter::once("retag").chain(args.iter().copied())).unwrap();
        run(cli, registry)
    }

    #[test]
    fn test_check_skips_file_discovery() {
        // The crate root has no *.mp3, so discovering files would be fatal.
        assert_eq!(
            run_args(&["--check", "-q", "-T", "s/a/b/"]),
            ExitCode::Success
        );
    }

    #[test]
    fn test_compile_error_is_fatal_before_any_file() {
        // A missing file would give FileFailed if it were ever opened.
        assert_eq!(
            run_args(&["-T", "s/a/b/", "-G", "s/(/x/", "no/such/file.mp3"]),
            ExitCode::FatalError
        );
    }

    #[test]
    fn test_check_still_compiles_editors() {
        assert_eq!(run_args(&["--check", "-Y", "$_ ="]), ExitCode::FatalError);
    }

    #[test]
    fn test_missing_file_sets_failure_status() {
        assert_eq!(
            run_args(&["-q", "no/such/one.mp3", "no/such/two.mp3"]),
            ExitCode::FileFailed
        );
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::FileFailed.code(), 1);
        assert_eq!(ExitCode::FatalError.code(), 2);
    }
}
