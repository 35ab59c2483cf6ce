//! End-to-end checks against the real ffmpeg. Skipped when ffmpeg or
//! ffprobe is not installed.

use std::path::Path;

use reelcut_media_model::segment::TimeSpan;
use reelcut_render_engine::tools::{ffmpeg_path, ffprobe_path, is_tool_available, run_ffmpeg};
use reelcut_render_engine::{
    compile_highlights, FfmpegToolchain, MediaToolchain, NormalizeOptions,
};
use reelcut_common::error::ReelcutError;

fn toolchain_available() -> bool {
    let available = is_tool_available(&ffmpeg_path()) && is_tool_available(&ffprobe_path());
    if !available {
        eprintln!("skipping: ffmpeg/ffprobe not available");
    }
    available
}

/// Write a short synthetic clip with an odd resolution.
fn make_test_video(path: &Path, secs: u32) {
    run_ffmpeg(
        [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            format!("testsrc=size=161x121:rate=25:duration={secs}").as_str(),
            "-f",
            "lavfi",
            "-i",
            format!("sine=frequency=440:duration={secs}").as_str(),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
            path.to_str().unwrap(),
        ],
        ReelcutError::normalization,
    )
    .unwrap();
}

#[test]
fn normalize_probe_decode_and_compile() {
    if !toolchain_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("upload.mkv");
    make_test_video(&upload, 4);

    let toolchain = FfmpegToolchain::new();
    let options = NormalizeOptions {
        target_height: Some(61),
        target_fps: Some(10.0),
    };
    let normalized = toolchain
        .normalize(&upload, &dir.path().join("processing"), "rt", &options)
        .unwrap();
    assert_eq!(normalized.file_name().unwrap(), "upload_rt.mp4");

    let source = toolchain.probe(&normalized).unwrap();
    assert_eq!(source.height, 60);
    assert_eq!(source.width % 2, 0);
    assert!((source.fps - 10.0).abs() < 1e-6);
    assert!((source.duration_secs - 4.0).abs() < 0.5);

    let frames: Vec<_> = toolchain
        .decode_frames(&source)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!((35..=45).contains(&frames.len()), "{} frames", frames.len());
    assert!(frames.iter().all(|f| f.data.len() == source.rgb_frame_len()));
    assert!((frames[10].timestamp_secs - 1.0).abs() < 1e-9);

    let output = dir.path().join("out").join("reel.mp4");
    let segments = [TimeSpan::new(0.0, 1.0), TimeSpan::new(2.0, 3.5)];
    compile_highlights(
        &toolchain,
        &source,
        &segments,
        &output,
        &dir.path().join("work"),
        "rt",
    )
    .unwrap();

    let reel = toolchain.probe(&output).unwrap();
    assert!((reel.fps - source.fps).abs() < 1e-6);
    let reel_frames = toolchain.decode_frames(&reel).unwrap().count();
    let reel_secs = reel_frames as f64 / reel.fps;
    let expected_secs: f64 = segments.iter().map(TimeSpan::duration_secs).sum();
    assert!(
        (reel_secs - expected_secs).abs() <= 1.0 / source.fps + 1e-3,
        "{reel_frames} frames ({reel_secs}s), expected {expected_secs}s"
    );
    assert!(!dir.path().join("work").join("rt").exists());
}

#[test]
fn broken_input_fails_normalization() {
    if !toolchain_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("broken.mov");
    std::fs::write(&upload, b"definitely not a movie").unwrap();

    let err = FfmpegToolchain::new()
        .normalize(
            &upload,
            &dir.path().join("processing"),
            "bad",
            &NormalizeOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, ReelcutError::Normalization { .. }));
    assert!(!dir.path().join("processing").join("broken_bad.mp4").exists());
}
