//! Normalized video source descriptor and decoded frames.

use std::path::PathBuf;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use serde::{Deserialize, Serialize};

/// Immutable description of a normalized video, created once after
/// normalization and probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Path to the normalized media file.
    pub path: PathBuf,

    /// Duration in seconds.
    pub duration_secs: f64,

    /// Constant frame rate guaranteed by normalization.
    pub fps: f64,

    /// Number of frames in the video stream.
    pub frame_count: u64,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,
}

impl VideoSource {
    /// Reject metadata the pipeline cannot work with.
    pub fn validate(&self) -> ReelcutResult<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ReelcutError::validation(format!(
                "video {} has invalid frame rate {}",
                self.path.display(),
                self.fps
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ReelcutError::validation(format!(
                "video {} has invalid duration {}",
                self.path.display(),
                self.duration_secs
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelcutError::validation(format!(
                "video {} has invalid resolution {}x{}",
                self.path.display(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Bytes in one packed RGB24 frame.
    pub fn rgb_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// A decoded frame handed to the pose-estimation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// Zero-based frame index.
    pub index: u64,

    /// Presentation time in seconds.
    pub timestamp_secs: f64,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Packed RGB24 pixel data, row-major.
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(duration_secs: f64, fps: f64) -> VideoSource {
        VideoSource {
            path: PathBuf::from("clip.mp4"),
            duration_secs,
            fps,
            frame_count: (duration_secs * fps) as u64,
            width: 1280,
            height: 720,
        }
    }

    #[test]
    fn test_valid_source_passes() {
        assert!(source(60.0, 30.0).validate().is_ok());
    }

    #[test]
    fn test_zero_fps_is_rejected() {
        let err = source(60.0, 0.0).validate().unwrap_err();
        assert!(matches!(err, ReelcutError::Validation { .. }));
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert!(source(0.0, 30.0).validate().is_err());
        assert!(source(f64::NAN, 30.0).validate().is_err());
    }

    #[test]
    fn test_rgb_frame_len() {
        let src = source(60.0, 30.0);
        assert_eq!(src.rgb_frame_len(), 1280 * 720 * 3);
    }
}
