//! core/tags/mod.rs
//!
//! The Tag I/O Adapter: everything that touches an MP3 on disk.
//!
//! The apply loop only sees the two traits below, so it can run against the
//! real `id3`/`symphonia` backend or an in-memory fake in tests.
//!
//! Public API:
//! - [`TagBackend::open`] opens one file and returns a [`TagFile`]
//! - [`TagFile`] reads/stages the seven fields, reports duration, saves
//! - dropping a [`TagFile`] releases it (there is no explicit close)

mod duration;
mod file;
mod read;
mod util;
mod write;

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use super::types::Field;

pub use file::Id3Backend;

/// Why a file could not be opened or saved.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file")]
    NotAFile,

    #[error("cannot read ID3 tag: {0}")]
    Read(#[source] id3::Error),

    #[error("not an MPEG audio file: {0}")]
    Probe(#[source] symphonia::core::errors::Error),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("cannot write ID3 tag: {0}")]
    Write(#[source] id3::Error),
}

/// Opens tag containers.
pub trait TagBackend {
    type File: TagFile;

    fn open(&self, path: &Path) -> Result<Self::File, TagError>;
}

/// One open tag container. Changes are staged in memory until [`TagFile::save`].
pub trait TagFile {
    /// Current text of `field`; missing frames read as `""`.
    fn get(&self, field: Field) -> String;

    /// Stage a new value. An empty value removes the frame.
    fn set(&mut self, field: Field, value: &str);

    /// Audio stream duration (zero when unknown).
    fn duration(&self) -> Duration;

    /// Stage a recomputed length frame from the probed stream duration.
    fn update_length(&mut self);

    /// Persist every staged change in one write.
    fn save(&mut self) -> Result<(), TagError>;
}
