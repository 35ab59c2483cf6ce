//! Detection facade: frames in, buffered highlight spans out.

use reelcut_common::error::ReelcutResult;
use reelcut_media_model::segment::{BufferedSegment, MergedSegment, RawSegment};
use reelcut_media_model::video::{VideoFrame, VideoSource};

use crate::config::DetectionConfig;
use crate::merge::{buffer_and_clamp, merge_spans};
use crate::sampler::{FrameSampler, PoseEstimator};
use crate::segmenter::SegmentStateMachine;

/// Output of the streaming detection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    /// Raw segments in frame indices, in detection order.
    pub raw_segments: Vec<RawSegment>,
    /// Frames decoded and scored.
    pub frames_sampled: u64,
    /// Frames in which a person was found.
    pub frames_with_pose: u64,
    /// Frames where the pose estimator failed.
    pub pose_failures: u64,
}

/// Highlight plan derived from a detection report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightPlan {
    pub merged: Vec<MergedSegment>,
    pub buffered: Vec<BufferedSegment>,
}

/// The segment detector.
pub struct SegmentDetector {
    config: DetectionConfig,
}

impl SegmentDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Create a detector with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(DetectionConfig::default())
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Stream frames through the sampler and state machine.
    ///
    /// Frames are scored and discarded one at a time. A decode error aborts
    /// the pass; pose estimator errors only blank out their frame.
    pub fn detect<I, E>(&self, frames: I, estimator: &mut E) -> ReelcutResult<DetectionReport>
    where
        I: Iterator<Item = ReelcutResult<VideoFrame>>,
        E: PoseEstimator + ?Sized,
    {
        let started = std::time::Instant::now();
        let mut machine = SegmentStateMachine::new(&self.config);
        let mut sampler = FrameSampler::new(frames, estimator);
        let mut raw_segments = Vec::new();

        for sample in sampler.by_ref() {
            let sample = sample?;
            if let Some(segment) = machine.push(&sample) {
                tracing::debug!(
                    start_frame = segment.start_frame,
                    end_frame = segment.end_frame,
                    "Segment closed"
                );
                raw_segments.push(segment);
            }
        }
        raw_segments.extend(machine.finish());

        let report = DetectionReport {
            raw_segments,
            frames_sampled: sampler.frames_sampled(),
            frames_with_pose: sampler.frames_with_pose(),
            pose_failures: sampler.pose_failures(),
        };

        tracing::info!(
            frames = report.frames_sampled,
            frames_with_pose = report.frames_with_pose,
            pose_failures = report.pose_failures,
            segments = report.raw_segments.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Detection pass finished"
        );

        Ok(report)
    }

    /// Convert raw segments to seconds, merge, buffer, and re-merge.
    pub fn plan(&self, raw_segments: &[RawSegment], source: &VideoSource) -> HighlightPlan {
        let spans: Vec<_> = raw_segments
            .iter()
            .map(|segment| segment.to_span(source.fps))
            .collect();

        let merged = merge_spans(&spans, self.config.merge_gap_secs);
        let buffered = buffer_and_clamp(
            &merged,
            self.config.pre_buffer_secs,
            self.config.post_buffer_secs,
            source.duration_secs,
        );

        tracing::info!(
            raw = raw_segments.len(),
            merged = merged.len(),
            buffered = buffered.len(),
            "Highlight plan built"
        );

        HighlightPlan { merged, buffered }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_media_model::pose::{Landmark, PoseDetection};
    use std::path::PathBuf;

    /// Moves the pose by `step` on frames inside `moving`, holds it elsewhere.
    struct Burst {
        moving: std::ops::Range<u64>,
        x: f64,
    }

    impl PoseEstimator for Burst {
        fn estimate(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection> {
            if self.moving.contains(&frame.index) {
                self.x += 0.05;
            }
            Ok(PoseDetection::Found(vec![Landmark::new(self.x, 0.5, 0.0)]))
        }
    }

    fn source(duration_secs: f64) -> VideoSource {
        VideoSource {
            path: PathBuf::from("clip.mp4"),
            duration_secs,
            fps: 30.0,
            frame_count: (duration_secs * 30.0) as u64,
            width: 2,
            height: 2,
        }
    }

    fn frames(count: u64) -> impl Iterator<Item = ReelcutResult<VideoFrame>> {
        (0..count).map(|index| {
            Ok(VideoFrame {
                index,
                timestamp_secs: index as f64 / 30.0,
                width: 2,
                height: 2,
                data: vec![0; 12],
            })
        })
    }

    #[test]
    fn test_detect_then_plan() {
        let detector = SegmentDetector::new(DetectionConfig {
            min_moving_frames: 5,
            max_stationary_frames: 10,
            ..Default::default()
        });
        let mut estimator = Burst {
            moving: 90..120,
            x: 0.1,
        };

        let report = detector.detect(frames(300), &mut estimator).unwrap();
        assert_eq!(report.frames_sampled, 300);
        assert_eq!(report.raw_segments, vec![RawSegment::new(90, 119)]);

        let plan = detector.plan(&report.raw_segments, &source(10.0));
        assert_eq!(plan.buffered.len(), 1);
        assert!((plan.buffered[0].start_secs - 1.0).abs() < 1e-9);
        assert!((plan.buffered[0].end_secs - (119.0 / 30.0 + 3.0)).abs() < 1e-9);
    }
}
