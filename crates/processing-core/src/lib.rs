//! Reelcut Processing Core: the segment detector
//!
//! Turns a stream of decoded frames into the list of time spans that make
//! up a highlight reel:
//! - **Sampler:** Query the pose estimator per frame and score landmark motion
//! - **Segmenter:** Hysteresis state machine over motion scores
//! - **Merge:** Gap-tolerant interval merge, then buffer, clamp, and re-merge
//!
//! This crate is pure computation with no I/O and no media toolchain.
//! All inputs are data; all outputs are data.

pub mod config;
pub mod detector;
pub mod merge;
pub mod sampler;
pub mod segmenter;

pub use config::DetectionConfig;
pub use detector::{DetectionReport, HighlightPlan, SegmentDetector};
pub use sampler::{FrameSampler, PoseEstimator};
pub use segmenter::SegmentStateMachine;
