//! Terminal pipeline result and coarse status updates.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use reelcut_common::error::{FailureKind, ReelcutError};
use serde::{Deserialize, Serialize};

use crate::segment::{total_duration_secs, BufferedSegment};

/// Failure reason reported when detection finds nothing.
pub const NO_SEGMENTS_REASON: &str = "no segments detected";

/// Prefix of the failure reason reported when ffmpeg fails during compilation.
pub const COMPILATION_FAILED_REASON: &str = "compilation failed";

/// Pipeline stages, used for status updates and failure context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Normalizing,
    Detecting,
    Compiling,
    Complete,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Normalizing => "normalizing",
            Self::Detecting => "detecting",
            Self::Compiling => "compiling",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a pipeline invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A highlight reel was written to the output path.
    Compiled,
    /// Processing finished but no moving person was found.
    NoSegments,
    /// The source metadata or configuration was rejected up front.
    InvalidInput,
    /// The source could not be decoded.
    DetectionFailed,
    /// ffmpeg failed to convert the upload into the canonical form.
    NormalizationFailed,
    /// ffmpeg failed while extracting or concatenating clips.
    CompilationFailed,
}

impl Outcome {
    fn from_failure(kind: FailureKind, stage: PipelineStage) -> Self {
        match (kind, stage) {
            (FailureKind::InvalidInput, _) => Self::InvalidInput,
            (FailureKind::Detection, _) => Self::DetectionFailed,
            (FailureKind::MediaToolchain, PipelineStage::Normalizing) => Self::NormalizationFailed,
            (FailureKind::MediaToolchain, _) => Self::CompilationFailed,
        }
    }
}

/// Coarse progress event emitted to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub stage: PipelineStage,
    pub message: String,
}

impl StatusUpdate {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Status callback for pipeline progress.
pub type StatusCallback = Box<dyn Fn(StatusUpdate) + Send>;

/// Terminal artifact of one pipeline invocation, owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Caller-supplied identifier of this invocation.
    pub job_id: String,

    /// Final buffered segments in ascending order.
    pub segments: Vec<BufferedSegment>,

    /// Destination of the highlight reel. Only exists on disk when
    /// `outcome` is [`Outcome::Compiled`].
    pub output_path: PathBuf,

    /// Whether processing ran to completion (including "nothing found").
    pub succeeded: bool,

    /// Why no reel was produced, if it wasn't.
    pub failure_reason: Option<String>,

    pub outcome: Outcome,

    /// Stage that failed, for failed outcomes.
    pub failed_stage: Option<PipelineStage>,

    /// Number of frames the sampler consumed.
    pub frames_sampled: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProcessingResult {
    /// A reel was written.
    pub fn compiled(
        job_id: impl Into<String>,
        output_path: PathBuf,
        segments: Vec<BufferedSegment>,
        frames_sampled: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            segments,
            output_path,
            succeeded: true,
            failure_reason: None,
            outcome: Outcome::Compiled,
            failed_stage: None,
            frames_sampled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Detection completed without finding any segment.
    pub fn no_segments(
        job_id: impl Into<String>,
        output_path: PathBuf,
        frames_sampled: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            segments: Vec::new(),
            output_path,
            succeeded: true,
            failure_reason: Some(NO_SEGMENTS_REASON.to_string()),
            outcome: Outcome::NoSegments,
            failed_stage: None,
            frames_sampled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// A stage failed; the error decides the reported category.
    pub fn failed(
        job_id: impl Into<String>,
        output_path: PathBuf,
        stage: PipelineStage,
        error: &ReelcutError,
        segments: Vec<BufferedSegment>,
        frames_sampled: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        let outcome = Outcome::from_failure(error.failure_kind(), stage);
        let reason = match outcome {
            Outcome::CompilationFailed => format!("{COMPILATION_FAILED_REASON}: {error}"),
            _ => format!("{stage} failed: {error}"),
        };
        Self {
            job_id: job_id.into(),
            segments,
            output_path,
            succeeded: false,
            failure_reason: Some(reason),
            outcome,
            failed_stage: Some(stage),
            frames_sampled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Whether a highlight reel exists at `output_path`.
    pub fn has_output(&self) -> bool {
        self.outcome == Outcome::Compiled
    }

    /// Seconds of footage in the reel.
    pub fn highlight_duration_secs(&self) -> f64 {
        total_duration_secs(&self.segments)
    }
}
