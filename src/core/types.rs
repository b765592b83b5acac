//! Core data types shared between the script engine, the apply loop and the CLI.
//!
//! Rule of thumb:
//! - These are "boring bags of data"
//! - No tag parsing code
//! - No console output
//!
//! `Field` is the closed set of tag slots we edit. Everything else in the crate
//! is keyed by it (fragments, compiled editors, report lines).

use std::fmt;

/// One of the seven editable ID3 text slots.
///
/// The declaration order is the processing order: every file runs its editors
/// title first, year last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Artist,
    Album,
    Genre,
    Track,
    Comment,
    Year,
}

impl Field {
    /// All fields, in processing order.
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Artist,
        Field::Album,
        Field::Genre,
        Field::Track,
        Field::Comment,
        Field::Year,
    ];

    /// Position in [`Field::ALL`]; used to index per-field arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, as used in flags and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Album => "album",
            Field::Genre => "genre",
            Field::Track => "track",
            Field::Comment => "comment",
            Field::Year => "year",
        }
    }

    /// Capitalised label for the before/after report.
    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Artist => "Artist",
            Field::Album => "Album",
            Field::Genre => "Genre",
            Field::Track => "Track",
            Field::Comment => "Comment",
            Field::Year => "Year",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One registered transform step for a field.
///
/// `Literal` keeps the user's text as plain data. It is never lexed, so text
/// like `"it's $5; last"` is stored exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Script text, compiled by `core::script`.
    Expression(String),
    /// Fixed replacement value (`-t foo`).
    Literal(String),
}

/// Before/after for one field of one file.
///
/// Lives only for the current file: computed right after the editor runs,
/// consumed by the report/write step, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub field: Field,
    pub old: String,
    pub new: String,
}

impl EditOutcome {
    /// Exact string comparison, no normalisation.
    pub fn changed(&self) -> bool {
        self.old != self.new
    }
}

/// Switches that shape the apply loop (all come straight from CLI flags).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute and report, never persist.
    pub dry_run: bool,
    /// Suppress per-field and per-file report lines (diagnostics still print).
    pub quiet: bool,
    /// Rewrite the TLEN frame from the probed stream duration.
    pub update_length: bool,
}

/// What happened across a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files that opened and went through all seven editors.
    pub processed: usize,
    /// Files with at least one change (saved unless dry run).
    pub updated: usize,
    /// Files where nothing changed.
    pub unchanged: usize,
    /// Files that failed to open or to save.
    pub failed: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
