//! Detection parameters.

use reelcut_common::config::DetectionDefaults;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use serde::{Deserialize, Serialize};

/// Configuration for segment detection and highlight planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Mean landmark displacement at or above which a frame counts as moving.
    pub movement_threshold: f64,

    /// Unbroken moving frames required to open a segment.
    pub min_moving_frames: u32,

    /// Unbroken stationary frames that close an open segment.
    pub max_stationary_frames: u32,

    /// Segments separated by less than this many seconds are merged.
    pub merge_gap_secs: f64,

    /// Seconds of context added before each merged segment.
    pub pre_buffer_secs: f64,

    /// Seconds of context added after each merged segment.
    pub post_buffer_secs: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::from(&DetectionDefaults::default())
    }
}

impl From<&DetectionDefaults> for DetectionConfig {
    fn from(defaults: &DetectionDefaults) -> Self {
        Self {
            movement_threshold: defaults.movement_threshold,
            min_moving_frames: defaults.min_moving_frames,
            max_stationary_frames: defaults.max_stationary_frames,
            merge_gap_secs: defaults.merge_gap_secs,
            pre_buffer_secs: defaults.pre_buffer_secs,
            post_buffer_secs: defaults.post_buffer_secs,
        }
    }
}

impl DetectionConfig {
    /// Reject parameter combinations the state machine and merge passes
    /// cannot honor.
    pub fn validate(&self) -> ReelcutResult<()> {
        check_non_negative("movement_threshold", self.movement_threshold)?;
        check_non_negative("merge_gap_secs", self.merge_gap_secs)?;
        check_non_negative("pre_buffer_secs", self.pre_buffer_secs)?;
        check_non_negative("post_buffer_secs", self.post_buffer_secs)?;

        if self.min_moving_frames == 0 {
            return Err(ReelcutError::config("min_moving_frames must be at least 1"));
        }
        if self.max_stationary_frames == 0 {
            return Err(ReelcutError::config(
                "max_stationary_frames must be at least 1",
            ));
        }
        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> ReelcutResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ReelcutError::config(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}
