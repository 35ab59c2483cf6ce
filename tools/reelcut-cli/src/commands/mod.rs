pub mod batch;
pub mod check;
pub mod config;
pub mod process;

use clap::Args;
use reelcut_common::config::AppConfig;

/// Detection and normalization overrides shared by `process` and `batch`.
/// Unset flags keep the configured values.
#[derive(Args, Debug, Clone, Default)]
pub struct DetectionArgs {
    /// Seconds of context before each segment [default: 2]
    #[arg(long)]
    pub buffer_before: Option<f64>,

    /// Seconds of context after each segment [default: 3]
    #[arg(long)]
    pub buffer_after: Option<f64>,

    /// Mean landmark displacement that counts as motion [default: 0.02]
    #[arg(long)]
    pub movement_threshold: Option<f64>,

    /// Consecutive moving frames that open a segment [default: 3]
    #[arg(long)]
    pub min_moving_frames: Option<u32>,

    /// Consecutive still frames that close a segment [default: 20]
    #[arg(long)]
    pub max_still_frames: Option<u32>,

    /// Merge segments closer than this many seconds [default: 1.0]
    #[arg(long)]
    pub merge_gap: Option<f64>,

    /// Downscale to this height before detection, 0 keeps the source [default: 720]
    #[arg(long)]
    pub resize_height: Option<u32>,

    /// Resample to this frame rate before detection, 0 keeps the source [default: 30]
    #[arg(long)]
    pub target_fps: Option<f64>,

    /// Pose sidecar command line (overrides pose.command/pose.args)
    #[arg(long)]
    pub pose_command: Option<String>,
}

impl DetectionArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        let detection = &mut config.detection;
        if let Some(v) = self.buffer_before {
            detection.pre_buffer_secs = v;
        }
        if let Some(v) = self.buffer_after {
            detection.post_buffer_secs = v;
        }
        if let Some(v) = self.movement_threshold {
            detection.movement_threshold = v;
        }
        if let Some(v) = self.min_moving_frames {
            detection.min_moving_frames = v;
        }
        if let Some(v) = self.max_still_frames {
            detection.max_stationary_frames = v;
        }
        if let Some(v) = self.merge_gap {
            detection.merge_gap_secs = v;
        }
        if let Some(v) = self.resize_height {
            config.normalization.target_height = (v > 0).then_some(v);
        }
        if let Some(v) = self.target_fps {
            config.normalization.target_fps = (v > 0.0).then_some(v);
        }
        if let Some(command_line) = &self.pose_command {
            let mut parts = command_line.split_whitespace().map(str::to_string);
            config.pose.command = parts.next();
            config.pose.args = parts.collect();
        }
    }
}
