//! Reelcut Render Engine
//!
//! Everything that touches media files: probing, normalization, frame
//! decoding, pose sidecar I/O, clip extraction, and concatenation, plus the
//! orchestrator that drives a video through the detection pipeline.
//!
//! # Pipeline Architecture
//!
//! ```text
//! upload.mov ── normalize (H.264, even dims, CFR) ── probe ──▶ VideoSource
//!                                                                  │
//!                          rawvideo rgb24 frames ◀── decode ───────┘
//!                                   │
//!                                   ├── pose sidecar ── motion score
//!                                   ▼
//!                           segment state machine
//!                                   │
//!                          merge ── buffer & clamp ── re-merge
//!                                   │
//!                     extract clip per span (scratch dir)
//!                                   │
//!                          concat (stream copy) ──▶ highlights.mp4
//! ```

pub mod compile;
pub mod decode;
pub mod normalize;
pub mod pipeline;
pub mod pose_sidecar;
pub mod probe;
pub mod toolchain;
pub mod tools;

pub use compile::compile_highlights;
pub use normalize::{normalize_video, NormalizeOptions};
pub use pipeline::{HighlightJob, HighlightPipeline};
pub use pose_sidecar::SidecarPoseEstimator;
pub use probe::probe_video;
pub use toolchain::{FfmpegToolchain, FrameStream, MediaToolchain};
