//! core/tags/write.rs
//! Stage one edited field into an `id3::Tag` (in memory; `TagFile::save` writes).
//!
//! Semantics:
//! - empty string => remove that frame from the tag
//! - anything else is written verbatim (no trimming)

use id3::frame::Comment;
use id3::{Tag, TagLike, Version};

use super::super::types::Field;
use super::util::set_text_or_remove;

pub(crate) fn write_field(tag: &mut Tag, field: Field, value: &str) {
    match field {
        Field::Title => set_text_or_remove(tag, "TIT2", value),
        Field::Artist => set_text_or_remove(tag, "TPE1", value),
        Field::Album => set_text_or_remove(tag, "TALB", value),
        Field::Genre => set_text_or_remove(tag, "TCON", value),
        Field::Track => set_text_or_remove(tag, "TRCK", value),
        Field::Comment => write_comment(tag, value),
        Field::Year => write_year(tag, value),
    }
}

/// Comment (COMM): replace with a single "eng" comment.
fn write_comment(tag: &mut Tag, value: &str) {
    let _ = tag.remove("COMM");
    if !value.is_empty() {
        let _ = tag.add_frame(Comment {
            lang: "eng".to_string(),
            description: "".to_string(),
            text: value.to_string(),
        });
    }
}

/// Year goes to whichever frame the tag already uses; new ones follow the
/// tag version (TDRC is v2.4 only).
fn write_year(tag: &mut Tag, value: &str) {
    if value.is_empty() {
        let _ = tag.remove("TDRC");
        let _ = tag.remove("TYER");
        return;
    }

    let id = if tag.get("TDRC").is_some() {
        "TDRC"
    } else if tag.get("TYER").is_some() || tag.version() != Version::Id3v24 {
        "TYER"
    } else {
        "TDRC"
    };
    tag.set_text(id, value);
}
