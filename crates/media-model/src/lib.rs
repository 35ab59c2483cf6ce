//! Reelcut Media Model
//!
//! Defines the data contracts handed between pipeline stages:
//! - **Video:** The normalized source descriptor and decoded frames
//! - **Pose:** Landmarks returned by the pose-estimation collaborator
//! - **Segment:** Per-frame samples, frame-indexed raw segments, and time spans
//! - **Result:** The terminal processing result and coarse status updates
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! frame so motion scores are independent of resolution.

pub mod pose;
pub mod result;
pub mod segment;
pub mod video;

pub use pose::*;
pub use result::*;
pub use segment::*;
pub use video::*;
