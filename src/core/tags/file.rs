//! core/tags/file.rs
//! The production backend: `id3` for the tag block, Symphonia for duration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use id3::{ErrorKind, Tag, TagLike, Version};
use tracing::{debug, trace, warn};

use super::super::types::Field;
use super::duration::probe_duration;
use super::read::read_field;
use super::write::write_field;
use super::{TagBackend, TagError, TagFile};

/// Opens MP3 files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct Id3Backend;

impl TagBackend for Id3Backend {
    type File = Mp3File;

    fn open(&self, path: &Path) -> Result<Mp3File, TagError> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(TagError::NotAFile);
        }

        // A file without an ID3v2 block is fine: start from an empty tag.
        let tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => {
                debug!(path = %path.display(), "no ID3 tag, starting empty");
                Tag::new()
            }
            Err(e) => return Err(TagError::Read(e)),
        };

        let probed = probe_duration(path)?;
        let duration = probed
            .or_else(|| tag.duration().map(|ms| Duration::from_millis(ms.into())))
            .unwrap_or_default();

        trace!(path = %path.display(), ?duration, version = ?tag.version(), "opened");

        Ok(Mp3File {
            path: path.to_path_buf(),
            tag,
            probed,
            duration,
        })
    }
}

/// An MP3 whose tag block is loaded in memory.
#[derive(Debug)]
pub struct Mp3File {
    path: PathBuf,
    tag: Tag,
    /// Duration measured from the stream, if the container declares it.
    probed: Option<Duration>,
    /// `probed`, else the tag's TLEN, else zero.
    duration: Duration,
}

impl TagFile for Mp3File {
    fn get(&self, field: Field) -> String {
        read_field(&self.tag, field)
    }

    fn set(&mut self, field: Field, value: &str) {
        write_field(&mut self.tag, field, value);
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn update_length(&mut self) {
        match self.probed {
            Some(d) => {
                let ms = u32::try_from(d.as_millis()).unwrap_or(u32::MAX);
                self.tag.set_duration(ms);
                debug!(path = %self.path.display(), ms, "length updated");
            }
            None => warn!(path = %self.path.display(), "stream length unknown, TLEN left as is"),
        }
    }

    fn save(&mut self) -> Result<(), TagError> {
        // id3 does not write v2.2; upgrade those to v2.3.
        let version = match self.tag.version() {
            Version::Id3v22 => Version::Id3v23,
            v => v,
        };
        self.tag
            .write_to_path(&self.path, version)
            .map_err(TagError::Write)
    }
}

impl Drop for Mp3File {
    fn drop(&mut self) {
        trace!(path = %self.path.display(), "closed");
    }
}
