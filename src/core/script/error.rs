//! Script error types.

use thiserror::Error;

use crate::core::types::Field;

/// A lex/parse/regex error inside one fragment, with the column it occurred at.
///
/// Columns are 1-based character offsets into the fragment text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, column: usize) -> Self {
        Self {
            message: message.into(),
            column,
        }
    }

    pub fn unexpected_eof(column: usize, expected: &str) -> Self {
        Self::new(
            format!("unexpected end of expression, expected {expected}"),
            column,
        )
    }

    pub fn unexpected_token(column: usize, expected: &str, found: &str) -> Self {
        Self::new(format!("expected {expected}, found {found}"), column)
    }
}

/// Result type for lexing and parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// A field's fragment chain failed to compile.
///
/// Always fatal for the run: nothing is opened once this is returned.
#[derive(Debug, Clone, Error)]
#[error("cannot compile {field} expression #{fragment}: {source}")]
pub struct CompileError {
    pub field: Field,
    /// 1-based position of the failing fragment within the field's chain.
    pub fragment: usize,
    #[source]
    pub source: ParseError,
}
