//! Normalization: convert arbitrary uploads into the canonical form the
//! detector and compiler rely on (MP4, H.264 yuv420p, even dimensions,
//! constant frame rate, optionally downscaled).

use std::path::{Path, PathBuf};

use reelcut_common::config::NormalizationDefaults;
use reelcut_common::error::{ReelcutError, ReelcutResult};

use crate::tools::run_ffmpeg;

/// Normalization targets. `None` keeps the source value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOptions {
    pub target_height: Option<u32>,
    pub target_fps: Option<f64>,
}

impl NormalizeOptions {
    /// Drop non-positive targets.
    pub fn sanitized(&self) -> Self {
        Self {
            target_height: self.target_height.filter(|h| *h > 0),
            target_fps: self.target_fps.filter(|f| f.is_finite() && *f > 0.0),
        }
    }
}

impl From<&NormalizationDefaults> for NormalizeOptions {
    fn from(defaults: &NormalizationDefaults) -> Self {
        Self {
            target_height: defaults.target_height,
            target_fps: defaults.target_fps,
        }
    }
}

/// Whether `input` must be transcoded before processing.
pub fn needs_transcode(input: &Path, options: &NormalizeOptions) -> bool {
    let options = options.sanitized();
    let is_mp4 = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);
    !is_mp4 || options.target_height.is_some() || options.target_fps.is_some()
}

/// Where the normalized copy of `input` is written for `job_id`.
pub fn normalized_path(input: &Path, processing_dir: &Path, job_id: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    processing_dir.join(format!("{stem}_{job_id}.mp4"))
}

/// Video filter chain for the given targets.
pub fn build_video_filter(options: &NormalizeOptions) -> String {
    let options = options.sanitized();
    let mut filters = Vec::new();
    match options.target_height {
        Some(height) => {
            let even_height = if height % 2 == 0 {
                height
            } else {
                height.saturating_sub(1).max(2)
            };
            filters.push(format!("scale=-2:{even_height}"));
        }
        None => filters.push("scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string()),
    }
    if let Some(fps) = options.target_fps {
        filters.push(format!("fps={fps}"));
    }
    filters.join(",")
}

/// ffmpeg arguments for the normalizing transcode.
pub fn build_normalize_args(src: &Path, dst: &Path, options: &NormalizeOptions) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-analyzeduration".to_string(),
        "100M".to_string(),
        "-probesize".to_string(),
        "100M".to_string(),
        "-i".to_string(),
        src.display().to_string(),
        "-ignore_unknown".to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "0:a:0?".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-vf".to_string(),
        build_video_filter(options),
        "-c:a".to_string(),
        "aac".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        dst.display().to_string(),
    ]
}

/// Ensure `input` is in canonical form, transcoding into `processing_dir`
/// when needed. Returns the path to process, which is `input` itself when
/// no conversion was required.
pub fn normalize_video(
    input: &Path,
    processing_dir: &Path,
    job_id: &str,
    options: &NormalizeOptions,
) -> ReelcutResult<PathBuf> {
    if !input.exists() {
        return Err(ReelcutError::FileNotFound {
            path: input.to_path_buf(),
        });
    }

    if !needs_transcode(input, options) {
        tracing::info!(path = %input.display(), "Input already normalized");
        return Ok(input.to_path_buf());
    }

    std::fs::create_dir_all(processing_dir)?;
    let output = normalized_path(input, processing_dir, job_id);
    let started = std::time::Instant::now();

    if let Err(err) = run_ffmpeg(
        build_normalize_args(input, &output, options),
        ReelcutError::normalization,
    ) {
        if output.exists() {
            let _ = std::fs::remove_file(&output);
        }
        return Err(err);
    }

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Normalized video"
    );
    Ok(output)
}
