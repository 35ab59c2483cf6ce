//! Process a single video.

use std::path::{Path, PathBuf};

use chrono::Utc;
use reelcut_common::config::AppConfig;
use reelcut_common::error::ReelcutError;
use reelcut_media_model::result::{
    Outcome, PipelineStage, ProcessingResult, StatusCallback, StatusUpdate,
};
use reelcut_processing_core::DetectionConfig;
use reelcut_render_engine::compile::validate_job_id;
use reelcut_render_engine::{
    FfmpegToolchain, HighlightJob, HighlightPipeline, NormalizeOptions, SidecarPoseEstimator,
};

pub fn run(
    config: &AppConfig,
    video: PathBuf,
    out: PathBuf,
    job_id: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let job_id = job_id.unwrap_or_else(new_job_id);
    if !json {
        println!("Processing: {}", video.display());
        println!("  Job: {job_id}");
        println!("  Output: {}", out.display());
    }

    let status: StatusCallback = Box::new(|update: StatusUpdate| {
        eprintln!("  [{}] {}", update.stage, update.message);
    });
    let result = process_video(config, &video, &out, &job_id, Some(&status));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if result.succeeded {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{}",
            result.failure_reason.unwrap_or_else(|| "processing failed".to_string())
        ))
    }
}

/// Fresh random job identifier.
pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Normalize, probe, detect, and compile one video.
///
/// The normalized intermediate is removed before returning.
pub fn process_video(
    config: &AppConfig,
    video: &Path,
    output: &Path,
    job_id: &str,
    status: Option<&StatusCallback>,
) -> ProcessingResult {
    let started_at = Utc::now();
    let fail = |stage: PipelineStage, err: ReelcutError| {
        tracing::error!(job_id, stage = %stage, error = %err, "Job failed before detection");
        let result = ProcessingResult::failed(
            job_id,
            output.to_path_buf(),
            stage,
            &err,
            Vec::new(),
            0,
            started_at,
        );
        if let Some(cb) = status {
            cb(StatusUpdate::new(
                stage,
                format!(
                    "Processing failed: {}",
                    result.failure_reason.as_deref().unwrap_or("unknown error")
                ),
            ));
        }
        result
    };

    if let Err(err) = validate_job_id(job_id) {
        return fail(PipelineStage::Validating, err);
    }
    let detection = DetectionConfig::from(&config.detection);
    if let Err(err) = detection.validate() {
        return fail(PipelineStage::Validating, err);
    }

    if let Some(cb) = status {
        cb(StatusUpdate::new(
            PipelineStage::Normalizing,
            "Preparing video...",
        ));
    }
    let toolchain = FfmpegToolchain::new();
    let options = NormalizeOptions::from(&config.normalization);
    let normalized = match toolchain.normalize(video, &config.processing_dir, job_id, &options) {
        Ok(path) => path,
        Err(err) => return fail(PipelineStage::Normalizing, err),
    };
    let _cleanup = NormalizedFile::new(video, &normalized);

    let source = match toolchain.probe(&normalized) {
        Ok(source) => source,
        Err(err) => return fail(PipelineStage::Validating, err),
    };

    let mut estimator = match SidecarPoseEstimator::from_config(&config.pose) {
        Ok(estimator) => estimator,
        Err(err) => return fail(PipelineStage::Detecting, err),
    };

    let job = HighlightJob {
        job_id: job_id.to_string(),
        source,
        output_path: output.to_path_buf(),
        work_dir: config.processing_dir.clone(),
    };
    HighlightPipeline::new(toolchain, detection).run(&job, &mut estimator, status)
}

/// Removes the normalized copy on drop unless it is the original upload.
struct NormalizedFile {
    path: Option<PathBuf>,
}

impl NormalizedFile {
    fn new(original: &Path, normalized: &Path) -> Self {
        let path = (original != normalized).then(|| normalized.to_path_buf());
        Self { path }
    }
}

impl Drop for NormalizedFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %err, "Failed to remove normalized file");
            }
        }
    }
}

pub fn print_summary(result: &ProcessingResult) {
    println!();
    match result.outcome {
        Outcome::Compiled => {
            println!("Highlights: {}", result.output_path.display());
            println!(
                "  {} segments, {:.1}s of footage ({} frames analyzed)",
                result.segments.len(),
                result.highlight_duration_secs(),
                result.frames_sampled
            );
            for (i, span) in result.segments.iter().enumerate() {
                println!(
                    "  {:>3}. {:>8.2}s - {:>8.2}s",
                    i + 1,
                    span.start_secs,
                    span.end_secs
                );
            }
        }
        Outcome::NoSegments => {
            println!(
                "Nothing found: no moving people in {} frames; no reel written.",
                result.frames_sampled
            );
        }
        _ => {
            println!(
                "Failed ({:?}): {}",
                result.outcome,
                result.failure_reason.as_deref().unwrap_or("unknown error")
            );
        }
    }
    let elapsed = result.finished_at - result.started_at;
    println!("  Took {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(new_job_id(), new_job_id());
    }

    #[test]
    fn test_normalized_copy_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("upload.mov");
        let normalized = dir.path().join("upload_job.mp4");
        std::fs::write(&original, b"src").unwrap();
        std::fs::write(&normalized, b"norm").unwrap();

        drop(NormalizedFile::new(&original, &normalized));
        assert!(original.exists());
        assert!(!normalized.exists());
    }

    #[test]
    fn test_original_upload_is_never_removed() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("upload.mp4");
        std::fs::write(&original, b"src").unwrap();

        drop(NormalizedFile::new(&original, &original));
        assert!(original.exists());
    }

    #[test]
    fn test_path_like_job_id_is_rejected_before_touching_files() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("upload.mov");
        std::fs::write(&upload, b"src").unwrap();
        let config = AppConfig {
            processing_dir: dir.path().join("processing"),
            ..Default::default()
        };

        let result = process_video(&config, &upload, &dir.path().join("out.mp4"), "../downloads", None);

        assert!(!result.succeeded);
        assert_eq!(result.outcome, Outcome::InvalidInput);
        assert_eq!(result.failed_stage, Some(PipelineStage::Validating));
        assert!(!config.processing_dir.exists());
        assert!(upload.exists());
    }

    #[test]
    fn test_missing_video_fails_in_normalization_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            processing_dir: dir.path().join("processing"),
            ..Default::default()
        };
        let result = process_video(
            &config,
            &dir.path().join("missing.mov"),
            &dir.path().join("out.mp4"),
            "job",
            None,
        );
        assert!(!result.succeeded);
        assert_eq!(result.failed_stage, Some(PipelineStage::Normalizing));
        assert_eq!(result.outcome, Outcome::InvalidInput);
    }
}
