//! Media toolchain abstraction used by the highlight pipeline.

use std::path::{Path, PathBuf};

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_media_model::segment::TimeSpan;
use reelcut_media_model::video::{VideoFrame, VideoSource};

use crate::decode::FrameReader;
use crate::normalize::{normalize_video, NormalizeOptions};
use crate::probe::probe_video;
use crate::tools::{absolute_path, ffmpeg_path, ffprobe_path, is_tool_available, run_ffmpeg};

/// Boxed frame stream produced by a toolchain.
pub type FrameStream = Box<dyn Iterator<Item = ReelcutResult<VideoFrame>>>;

/// Decoding and cutting capability (ffmpeg in production, fakes in tests).
pub trait MediaToolchain {
    /// Toolchain name.
    fn name(&self) -> &str;

    /// Lazily decode every frame of `source`.
    fn decode_frames(&self, source: &VideoSource) -> ReelcutResult<FrameStream>;

    /// Cut `span` out of `source` into a standalone clip at `dest`.
    fn extract_clip(&self, source: &VideoSource, span: &TimeSpan, dest: &Path)
        -> ReelcutResult<()>;

    /// Join `clips` in order into `dest`.
    fn concat_clips(&self, clips: &[PathBuf], dest: &Path) -> ReelcutResult<()>;
}

impl<T: MediaToolchain + ?Sized> MediaToolchain for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decode_frames(&self, source: &VideoSource) -> ReelcutResult<FrameStream> {
        (**self).decode_frames(source)
    }

    fn extract_clip(
        &self,
        source: &VideoSource,
        span: &TimeSpan,
        dest: &Path,
    ) -> ReelcutResult<()> {
        (**self).extract_clip(source, span, dest)
    }

    fn concat_clips(&self, clips: &[PathBuf], dest: &Path) -> ReelcutResult<()> {
        (**self).concat_clips(clips, dest)
    }
}

/// ffmpeg/ffprobe-backed toolchain.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolchain;

impl FfmpegToolchain {
    pub fn new() -> Self {
        Self
    }

    /// Whether ffmpeg and ffprobe both run on this system.
    pub fn is_available(&self) -> bool {
        is_tool_available(&ffmpeg_path()) && is_tool_available(&ffprobe_path())
    }

    /// Describe a media file.
    pub fn probe(&self, path: &Path) -> ReelcutResult<VideoSource> {
        probe_video(path)
    }

    /// Convert an upload into the canonical processing form.
    pub fn normalize(
        &self,
        input: &Path,
        processing_dir: &Path,
        job_id: &str,
        options: &NormalizeOptions,
    ) -> ReelcutResult<PathBuf> {
        normalize_video(input, processing_dir, job_id, options)
    }
}

/// Seconds formatted for ffmpeg's `-ss`/`-t`.
fn ffmpeg_secs(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}

/// ffmpeg arguments that re-encode `span` of `input` into `dest`.
///
/// Every clip gets identical codec parameters so the concat step can
/// stream-copy.
pub fn build_extract_args(input: &Path, span: &TimeSpan, dest: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        ffmpeg_secs(span.start_secs),
        "-i".to_string(),
        input.display().to_string(),
        "-t".to_string(),
        ffmpeg_secs(span.duration_secs()),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "0:a:0?".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-ar".to_string(),
        "48000".to_string(),
        "-ac".to_string(),
        "2".to_string(),
        "-avoid_negative_ts".to_string(),
        "make_zero".to_string(),
        dest.display().to_string(),
    ]
}

/// ffmpeg arguments that stream-copy the clips listed in `list_file`.
pub fn build_concat_args(list_file: &Path, dest: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_file.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        dest.display().to_string(),
    ]
}

/// Concat demuxer list body. Entries are absolute because the demuxer
/// resolves relative entries against the list file's directory. Single
/// quotes are escaped as `'\''`.
pub fn concat_list_contents(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| {
            let escaped = absolute_path(clip)
                .display()
                .to_string()
                .replace('\'', r"'\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

impl MediaToolchain for FfmpegToolchain {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn decode_frames(&self, source: &VideoSource) -> ReelcutResult<FrameStream> {
        Ok(Box::new(FrameReader::spawn(source)?))
    }

    fn extract_clip(
        &self,
        source: &VideoSource,
        span: &TimeSpan,
        dest: &Path,
    ) -> ReelcutResult<()> {
        if span.duration_secs() <= 0.0 {
            return Err(ReelcutError::compilation(format!(
                "refusing to extract empty span {:.3}-{:.3}",
                span.start_secs, span.end_secs
            )));
        }
        run_ffmpeg(
            build_extract_args(&source.path, span, dest),
            ReelcutError::compilation,
        )
    }

    fn concat_clips(&self, clips: &[PathBuf], dest: &Path) -> ReelcutResult<()> {
        let Some(first) = clips.first() else {
            return Err(ReelcutError::compilation("no clips to concatenate"));
        };

        // The list lives with the clips so it goes away with the scratch dir.
        let list_dir = first
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let list_file = absolute_path(&list_dir).join("concat.txt");
        std::fs::write(&list_file, concat_list_contents(clips))?;
        let result = run_ffmpeg(build_concat_args(&list_file, dest), ReelcutError::compilation);
        let _ = std::fs::remove_file(&list_file);
        result
    }
}
