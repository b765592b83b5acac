//! core/tags/read.rs
//! Read one editable field out of an `id3::Tag` as plain text.
//!
//! - Values are returned raw (no trimming, TRCK stays "3/12")
//! - Missing frames read as an empty string, so editors always get a value

use id3::{Tag, TagLike};

use super::super::types::Field;
use super::util::{first_comment, text_frame};

pub(crate) fn read_field(tag: &Tag, field: Field) -> String {
    let value = match field {
        Field::Title => tag
            .title()
            .map(str::to_owned)
            .or_else(|| text_frame(tag, "TIT2")),
        Field::Artist => tag
            .artist()
            .map(str::to_owned)
            .or_else(|| text_frame(tag, "TPE1")),
        Field::Album => tag
            .album()
            .map(str::to_owned)
            .or_else(|| text_frame(tag, "TALB")),
        // Raw TCON text: "(17)Rock" stays as written.
        Field::Genre => text_frame(tag, "TCON"),
        Field::Track => text_frame(tag, "TRCK"),
        Field::Comment => first_comment(tag),
        // Most modern tags use TDRC; v2.3 writers use TYER.
        Field::Year => text_frame(tag, "TDRC").or_else(|| text_frame(tag, "TYER")),
    };
    value.unwrap_or_default()
}
