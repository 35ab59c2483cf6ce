//! Error types shared across Reelcut crates.

use std::path::PathBuf;

/// Top-level error type for Reelcut operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelcutError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Normalization error: {message}")]
    Normalization { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Pose estimation error: {message}")]
    Pose { message: String },

    #[error("Compilation error: {message}")]
    Compilation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelcutError.
pub type ReelcutResult<T> = Result<T, ReelcutError>;

/// Coarse category a caller uses to decide how to report a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The input was rejected before the pipeline started.
    InvalidInput,
    /// The source could not be read or decoded.
    Detection,
    /// ffmpeg failed while normalizing, extracting, or concatenating.
    MediaToolchain,
}

impl ReelcutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization {
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn pose(msg: impl Into<String>) -> Self {
        Self::Pose {
            message: msg.into(),
        }
    }

    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::Compilation {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Map this error onto the category reported to the job layer.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } | Self::Config { .. } | Self::FileNotFound { .. } => {
                FailureKind::InvalidInput
            }
            Self::Normalization { .. } | Self::Compilation { .. } => {
                FailureKind::MediaToolchain
            }
            Self::Decode { .. }
            | Self::Pose { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => FailureKind::Detection,
        }
    }
}
