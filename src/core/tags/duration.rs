//! core/tags/duration.rs
//! Stream duration via Symphonia (demux only, nothing is decoded).

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use super::TagError;

/// Probe `path` and return the default track's duration, if the container
/// declares one.
///
/// Fails when the file cannot be opened or is not a recognisable audio stream.
pub fn probe_duration(path: &Path) -> Result<Option<Duration>, TagError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(TagError::Probe)?;

    let track = probed
        .format
        .default_track()
        .ok_or(TagError::NoAudioTrack)?;

    let params = &track.codec_params;
    Ok(duration_from_params(params.time_base, params.n_frames))
}

fn duration_from_params(time_base: Option<TimeBase>, n_frames: Option<u64>) -> Option<Duration> {
    let tb = time_base?;
    let frames = n_frames?;

    let t = tb.calc_time(frames);
    // Time is { seconds: u64, frac: f64 } in symphonia 0.5.x.
    let whole = Duration::from_secs(t.seconds);
    Some(whole + Duration::from_secs_f64(t.frac))
}
