//! core/script/mod.rs
//!
//! The scripted-edit engine.
//!
//! Two phases, on purpose:
//! - (A) flag parsing fills a mutable [`Registry`] with fragments, per field,
//!   in command-line order
//! - (B) [`Registry::compile`] freezes it into an [`EditorSet`]: one
//!   [`CompiledEditor`] per field, built once before any file is opened
//!
//! An editor is a pipeline. Each fragment sees the value left by the previous
//! one, and `last` ends the pipeline early for that one invocation.
//!
//! Editors can read exactly four things: the field value (`$_`, the only
//! writable binding), `$file`, `$length` and `$seconds` from the [`Context`].

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;

use std::time::Duration;

use tracing::debug;

use super::types::{Field, Fragment};
use ast::Program;
use eval::Flow;

pub use error::CompileError;

/// Expression appended to every field by `--ascii`: drops everything outside
/// printable ASCII (0x20..=0x7E).
pub const ASCII_ONLY: &str = r"s/[^\x20-\x7E]//g";

/// Fragments collected while parsing flags, per field, in registration order.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    fragments: [Vec<Fragment>; 7],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to one field's chain.
    pub fn register(&mut self, field: Field, fragment: Fragment) {
        self.fragments[field.index()].push(fragment);
    }

    /// Append the same fragment to all seven chains (used by `--ascii`).
    pub fn register_all(&mut self, fragment: Fragment) {
        for field in Field::ALL {
            self.register(field, fragment.clone());
        }
    }

    pub fn fragments(&self, field: Field) -> &[Fragment] {
        &self.fragments[field.index()]
    }

    /// Compile every field, in [`Field::ALL`] order. Stops at the first
    /// failure; no editor is usable unless all of them compiled.
    pub fn compile(self) -> Result<EditorSet, CompileError> {
        let mut editors = Vec::with_capacity(Field::ALL.len());
        for field in Field::ALL {
            editors.push(compile(field, self.fragments(field))?);
        }
        Ok(EditorSet { editors })
    }
}

/// Read-only bindings for one file.
///
/// Rebuilt from the tag adapter for every file; editors only ever see `&Context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    file: String,
    length: String,
    seconds: u64,
}

impl Context {
    pub fn new(file: impl Into<String>, duration: Duration) -> Self {
        let seconds = duration.as_secs();
        Self {
            file: file.into(),
            length: format_length(seconds),
            seconds,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Duration as `M:SS`.
    pub fn length(&self) -> &str {
        &self.length
    }

    /// Duration in whole seconds.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }
}

/// `185` -> `"3:05"`. Minutes are not padded and not wrapped into hours.
pub fn format_length(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone)]
enum Step {
    /// Literal shorthand: the text is data, never parsed.
    Set(String),
    Run(Program),
}

/// The frozen pipeline for one field.
#[derive(Debug, Clone)]
pub struct CompiledEditor {
    field: Field,
    steps: Vec<Step>,
}

impl CompiledEditor {
    pub fn field(&self) -> Field {
        self.field
    }

    /// True when no fragment was registered for this field.
    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the pipeline against `value` and return the result.
    pub fn apply(&self, value: &str, ctx: &Context) -> String {
        let mut value = value.to_owned();
        for step in &self.steps {
            let flow = match step {
                Step::Set(text) => {
                    value.clone_from(text);
                    Flow::Continue
                }
                Step::Run(program) => program.run(&mut value, ctx),
            };
            if flow == Flow::Stop {
                break;
            }
        }
        value
    }
}

/// Compile one field's fragment chain.
pub fn compile(field: Field, fragments: &[Fragment]) -> Result<CompiledEditor, CompileError> {
    let mut steps = Vec::with_capacity(fragments.len());

    for (i, fragment) in fragments.iter().enumerate() {
        let step = match fragment {
            Fragment::Literal(text) => Step::Set(text.clone()),
            Fragment::Expression(source) => {
                let program = parser::parse(source).map_err(|source| CompileError {
                    field,
                    fragment: i + 1,
                    source,
                })?;
                Step::Run(program)
            }
        };
        steps.push(step);
    }

    debug!(field = %field, fragments = steps.len(), "compiled editor");
    Ok(CompiledEditor { field, steps })
}

/// One compiled editor per field.
#[derive(Debug, Clone)]
pub struct EditorSet {
    editors: Vec<CompiledEditor>,
}

impl EditorSet {
    pub fn get(&self, field: Field) -> &CompiledEditor {
        &self.editors[field.index()]
    }

    /// Editors in [`Field::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledEditor> {
        self.editors.iter()
    }
}
