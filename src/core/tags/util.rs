//! core/tags/util.rs
//! Small frame helpers shared by tag reading/writing.

use id3::frame::Content;
use id3::{Tag, TagLike};

/// Get a best-effort string value from a frame id.
/// Some frames that are "text-ish" may not be Content::Text.
pub(crate) fn text_frame(tag: &Tag, id: &str) -> Option<String> {
    let frame = tag.get(id)?;
    match frame.content() {
        Content::Text(s) => Some(s.clone()),
        Content::Link(s) => Some(s.clone()),
        _ => None,
    }
}

/// Text of the first COMM frame.
pub(crate) fn first_comment(tag: &Tag) -> Option<String> {
    for frame in tag.frames() {
        if frame.id() == "COMM" {
            if let Content::Comment(c) = frame.content() {
                return Some(c.text.clone());
            }
        }
    }
    None
}

/// Set a plain text frame, or remove it when `value` is empty.
pub(crate) fn set_text_or_remove(tag: &mut Tag, id: &str, value: &str) {
    if value.is_empty() {
        let _ = tag.remove(id); // TagLike::remove returns Vec<Frame>; discard it
    } else {
        tag.set_text(id, value);
    }
}
