//! Console output.
//!
//! - stdout: the before/after blocks and per-file summary lines (muted by `--quiet`)
//! - stderr: per-file diagnostics (never muted)
//!
//! Both streams are generic so tests can capture them. A failed write (e.g. a
//! closed pipe) is logged once and never stops the run.

use std::fmt::{self, Display};
use std::io::{self, Stderr, Stdout, Write};
use std::path::Path;

use tracing::warn;

use super::types::EditOutcome;

/// Width of the label column ("Comment" is the longest label).
const LABEL_WIDTH: usize = 7;

pub struct Reporter<O: Write, E: Write> {
    out: O,
    err: E,
    quiet: bool,
    write_failed: bool,
}

impl Reporter<Stdout, Stderr> {
    pub fn console(quiet: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), quiet)
    }
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E, quiet: bool) -> Self {
        Self {
            out,
            err,
            quiet,
            write_failed: false,
        }
    }

    /// ```text
    /// Title   : "Episode 1"
    ///         : "Podcast: Episode 1"
    /// ```
    pub fn field_change(&mut self, outcome: &EditOutcome) {
        if self.quiet {
            return;
        }
        let label = outcome.field.label();
        let (old, new) = (&outcome.old, &outcome.new);
        self.line(format_args!("{label:<LABEL_WIDTH$} : \"{old}\"\n"));
        self.line(format_args!("{:<LABEL_WIDTH$} : \"{new}\"\n", ""));
    }

    pub fn unchanged(&mut self, path: &Path) {
        if !self.quiet {
            self.line(format_args!("Unchanged tags in {}\n", path.display()));
        }
    }

    pub fn updating(&mut self, path: &Path) {
        if !self.quiet {
            self.line(format_args!("Updating tags in {}\n", path.display()));
        }
    }

    /// A file could not be opened or saved.
    pub fn failure(&mut self, path: &Path, error: &dyn Display) {
        let result = writeln!(self.err, "retag: {}: {error}", path.display());
        self.note(result);
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        let result = self.out.write_fmt(args);
        self.note(result);
    }

    fn note(&mut self, result: io::Result<()>) {
        let Err(e) = result else {
            return;
        };
        if !self.write_failed {
            warn!(error = %e, "cannot write report output");
            self.write_failed = true;
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}
