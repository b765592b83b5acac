//! `--check`: make sure the tag and audio libraries can do their job here.

use id3::{Tag, TagLike, Version};
use symphonia::core::codecs::CODEC_TYPE_MP3;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("no MP3 support registered in symphonia")]
    NoMp3Codec,

    #[error("id3 cannot serialise a tag: {0}")]
    Id3(#[from] id3::Error),

    #[error("id3 produced a malformed tag header")]
    BadHeader,
}

pub fn check_dependencies() -> Result<(), CheckError> {
    let codec = symphonia::default::get_codecs()
        .get_codec(CODEC_TYPE_MP3)
        .ok_or(CheckError::NoMp3Codec)?;
    debug!(codec = codec.short_name, "symphonia ok");

    let mut tag = Tag::new();
    tag.set_title("retag");
    let mut buf = Vec::new();
    tag.write_to(&mut buf, Version::Id3v24)?;
    if !buf.starts_with(b"ID3") {
        return Err(CheckError::BadHeader);
    }
    debug!(bytes = buf.len(), "id3 ok");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_available() {
        check_dependencies().unwrap();
    }
}
