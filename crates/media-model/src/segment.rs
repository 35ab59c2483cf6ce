//! Frame samples and the segment types produced from them.
//!
//! Detection works in frame indices ([`RawSegment`]); everything after the
//! state machine works in seconds ([`TimeSpan`]).

use serde::{Deserialize, Serialize};

/// Per-frame presence/motion signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Zero-based frame index.
    pub index: u64,

    /// Presentation time in seconds.
    pub timestamp_secs: f64,

    /// Mean landmark displacement from the last frame with landmarks.
    /// `None` when no person was detected in this frame.
    pub motion_score: Option<f64>,
}

impl FrameSample {
    pub fn new(index: u64, timestamp_secs: f64, motion_score: Option<f64>) -> Self {
        Self {
            index,
            timestamp_secs,
            motion_score,
        }
    }

    /// Whether a person was detected in this frame.
    pub fn is_present(&self) -> bool {
        self.motion_score.is_some()
    }
}

/// A closed detection interval in frame indices (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSegment {
    pub start_frame: u64,
    pub end_frame: u64,
}

impl RawSegment {
    pub fn new(start_frame: u64, end_frame: u64) -> Self {
        debug_assert!(start_frame <= end_frame);
        Self {
            start_frame,
            end_frame,
        }
    }

    /// Number of frames covered.
    pub fn frame_len(&self) -> u64 {
        self.end_frame - self.start_frame + 1
    }

    /// Convert to seconds at the given frame rate.
    pub fn to_span(&self, fps: f64) -> TimeSpan {
        TimeSpan::new(self.start_frame as f64 / fps, self.end_frame as f64 / fps)
    }
}

/// A time interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start_secs: f64,
    pub end_secs: f64,
}

/// A span after the tolerance-gap merge pass.
pub type MergedSegment = TimeSpan;

/// A span after padding, clamping, and the re-merge pass.
pub type BufferedSegment = TimeSpan;

impl TimeSpan {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Gap from the end of `self` to the start of `next` (negative on overlap).
    pub fn gap_to(&self, next: &TimeSpan) -> f64 {
        next.start_secs - self.end_secs
    }
}

/// Total seconds covered by a sorted, non-overlapping span list.
pub fn total_duration_secs(spans: &[TimeSpan]) -> f64 {
    spans.iter().map(TimeSpan::duration_secs).sum()
}
