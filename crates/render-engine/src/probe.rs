//! ffprobe-backed construction of [`VideoSource`] descriptors.

use std::path::Path;
use std::process::Command;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_model::video::VideoSource;
use serde::Deserialize;

use crate::tools::ffprobe_path;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe a media file and describe its first video stream.
pub fn probe_video(path: &Path) -> ReelcutResult<VideoSource> {
    if !path.exists() {
        return Err(ReelcutError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new(ffprobe_path())
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,avg_frame_rate,r_frame_rate,nb_frames,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReelcutError::decode(format!("failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ReelcutError::decode(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let source = parse_probe_json(path, &raw)?;
    tracing::debug!(
        path = %path.display(),
        duration_secs = source.duration_secs,
        fps = source.fps,
        frames = source.frame_count,
        width = source.width,
        height = source.height,
        "Probed video"
    );
    Ok(source)
}

/// Build a [`VideoSource`] from ffprobe's JSON output.
pub fn parse_probe_json(path: &Path, raw: &str) -> ReelcutResult<VideoSource> {
    let parsed: ProbeOutput = serde_json::from_str(raw)?;
    let stream = parsed.streams.into_iter().next().ok_or_else(|| {
        ReelcutError::decode(format!("{} has no video stream", path.display()))
    })?;

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rational))
        .unwrap_or(0.0);

    let parse_secs = |d: Option<String>| d.and_then(|d| d.trim().parse::<f64>().ok());
    let duration_secs = parse_secs(parsed.format.and_then(|f| f.duration))
        .or_else(|| parse_secs(stream.duration.clone()))
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .and_then(|n| n.trim().parse::<u64>().ok())
        .unwrap_or_else(|| (duration_secs * fps).round().max(0.0) as u64);

    Ok(VideoSource {
        path: path.to_path_buf(),
        duration_secs,
        fps,
        frame_count,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

/// Parse an ffprobe rational such as `30000/1001`. Zero denominators and
/// zero rates yield `None`.
fn parse_rational(raw: &str) -> Option<f64> {
    let value = match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rational() {
        assert!((parse_rational("30000/1001").unwrap() - 29.97).abs() < 0.001);
        assert_eq!(parse_rational("30/1"), Some(30.0));
        assert_eq!(parse_rational("0/0"), None);
        assert_eq!(parse_rational("25"), Some(25.0));
    }

    #[test]
    fn test_parse_probe_json() {
        let raw = r#"{
            "streams": [{
                "width": 1280, "height": 720,
                "avg_frame_rate": "30/1", "r_frame_rate": "30/1",
                "nb_frames": "1800", "duration": "60.000000"
            }],
            "format": {"duration": "60.021333"}
        }"#;
        let source = parse_probe_json(Path::new("a.mp4"), raw).unwrap();
        assert_eq!(source.width, 1280);
        assert_eq!(source.frame_count, 1800);
        assert!((source.fps - 30.0).abs() < 1e-9);
        assert!((source.duration_secs - 60.021333).abs() < 1e-9);
    }

    #[test]
    fn test_missing_nb_frames_is_estimated() {
        let raw = r#"{
            "streams": [{"width": 640, "height": 360, "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}],
            "format": {"duration": "4.0"}
        }"#;
        let source = parse_probe_json(Path::new("a.mkv"), raw).unwrap();
        assert!((source.fps - 25.0).abs() < 1e-9);
        assert_eq!(source.frame_count, 100);
    }

    #[test]
    fn test_no_video_stream_is_decode_error() {
        let err = parse_probe_json(Path::new("a.m4a"), r#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, ReelcutError::Decode { .. }));
    }
}
