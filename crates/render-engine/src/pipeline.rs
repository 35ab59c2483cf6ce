//! Pipeline orchestration for one video.

use std::path::PathBuf;

use chrono::Utc;
use reelcut_common::error::ReelcutError;
use reelcut_media_model::result::{PipelineStage, ProcessingResult, StatusCallback, StatusUpdate};
use reelcut_media_model::segment::BufferedSegment;
use reelcut_media_model::video::VideoSource;
use reelcut_processing_core::{DetectionConfig, PoseEstimator, SegmentDetector};

use crate::compile::{compile_highlights, validate_job_id};
use crate::toolchain::MediaToolchain;

/// One pipeline invocation. Each job owns its scratch space and output.
#[derive(Debug, Clone)]
pub struct HighlightJob {
    /// Caller-supplied identifier, used to namespace scratch files.
    pub job_id: String,

    /// Normalized, probed source video.
    pub source: VideoSource,

    /// Where the highlight reel is written.
    pub output_path: PathBuf,

    /// Parent of the per-job scratch directory.
    pub work_dir: PathBuf,
}

/// Detect, merge, buffer, and compile a highlight reel.
pub struct HighlightPipeline<T: MediaToolchain> {
    toolchain: T,
    detector: SegmentDetector,
}

struct StageFailure {
    stage: PipelineStage,
    error: ReelcutError,
    segments: Vec<BufferedSegment>,
}

impl StageFailure {
    fn at(stage: PipelineStage, error: ReelcutError) -> Self {
        Self {
            stage,
            error,
            segments: Vec::new(),
        }
    }
}

impl<T: MediaToolchain> HighlightPipeline<T> {
    pub fn new(toolchain: T, config: DetectionConfig) -> Self {
        Self {
            toolchain,
            detector: SegmentDetector::new(config),
        }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn config(&self) -> &DetectionConfig {
        self.detector.config()
    }

    /// Run the whole pipeline. Never panics on bad input; every outcome is
    /// reported through the returned [`ProcessingResult`].
    pub fn run(
        &self,
        job: &HighlightJob,
        estimator: &mut dyn PoseEstimator,
        status: Option<&StatusCallback>,
    ) -> ProcessingResult {
        let started_at = Utc::now();
        let span = tracing::info_span!("highlight_job", job_id = %job.job_id);
        let _guard = span.enter();

        let emit = |stage: PipelineStage, message: String| {
            tracing::info!(stage = %stage, "{message}");
            if let Some(cb) = status {
                cb(StatusUpdate::new(stage, message));
            }
        };

        let mut frames_sampled = 0;
        match self.execute(job, estimator, &emit, &mut frames_sampled) {
            Ok(segments) if segments.is_empty() => {
                emit(PipelineStage::Complete, "No moving humans detected.".to_string());
                ProcessingResult::no_segments(
                    job.job_id.clone(),
                    job.output_path.clone(),
                    frames_sampled,
                    started_at,
                )
            }
            Ok(segments) => {
                emit(PipelineStage::Complete, "Processing complete!".to_string());
                ProcessingResult::compiled(
                    job.job_id.clone(),
                    job.output_path.clone(),
                    segments,
                    frames_sampled,
                    started_at,
                )
            }
            Err(failure) => {
                tracing::error!(
                    stage = %failure.stage,
                    error = %failure.error,
                    "Highlight job failed"
                );
                let result = ProcessingResult::failed(
                    job.job_id.clone(),
                    job.output_path.clone(),
                    failure.stage,
                    &failure.error,
                    failure.segments,
                    frames_sampled,
                    started_at,
                );
                if let Some(cb) = status {
                    cb(StatusUpdate::new(
                        failure.stage,
                        format!(
                            "Processing failed: {}",
                            result.failure_reason.as_deref().unwrap_or("unknown error")
                        ),
                    ));
                }
                result
            }
        }
    }

    fn execute(
        &self,
        job: &HighlightJob,
        estimator: &mut dyn PoseEstimator,
        emit: &dyn Fn(PipelineStage, String),
        frames_sampled: &mut u64,
    ) -> Result<Vec<BufferedSegment>, StageFailure> {
        let validate = || -> Result<(), ReelcutError> {
            self.detector.config().validate()?;
            job.source.validate()?;
            validate_job_id(&job.job_id)
        };
        validate().map_err(|e| StageFailure::at(PipelineStage::Validating, e))?;

        emit(PipelineStage::Detecting, "Detecting moving humans...".to_string());
        tracing::debug!(toolchain = self.toolchain.name(), "Decoding frames");
        let frames = self
            .toolchain
            .decode_frames(&job.source)
            .map_err(|e| StageFailure::at(PipelineStage::Detecting, e))?;
        let report = self
            .detector
            .detect(frames, estimator)
            .map_err(|e| StageFailure::at(PipelineStage::Detecting, e))?;
        *frames_sampled = report.frames_sampled;

        let plan = self.detector.plan(&report.raw_segments, &job.source);
        if plan.buffered.is_empty() {
            return Ok(Vec::new());
        }

        emit(
            PipelineStage::Compiling,
            format!("Found {} segments. Compiling...", plan.buffered.len()),
        );
        compile_highlights(
            &self.toolchain,
            &job.source,
            &plan.buffered,
            &job.output_path,
            &job.work_dir,
            &job.job_id,
        )
        .map_err(|error| StageFailure {
            stage: PipelineStage::Compiling,
            error,
            segments: plan.buffered.clone(),
        })?;

        Ok(plan.buffered)
    }
}
