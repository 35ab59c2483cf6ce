use std::ops::RangeInclusive;
use std::path::PathBuf;

use reelcut_common::error::ReelcutResult;
use reelcut_media_model::pose::{Landmark, PoseDetection};
use reelcut_media_model::segment::RawSegment;
use reelcut_media_model::video::{VideoFrame, VideoSource};
use reelcut_processing_core::{DetectionConfig, PoseEstimator, SegmentDetector};

const FPS: f64 = 30.0;

/// A person who stands still except during the given frame ranges, where
/// every landmark drifts by 0.05 per frame.
struct Performer {
    bursts: Vec<RangeInclusive<u64>>,
    offset: f64,
}

impl PoseEstimator for Performer {
    fn estimate(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection> {
        if self.bursts.iter().any(|burst| burst.contains(&frame.index)) {
            self.offset += 0.05;
        }
        let landmarks = (0..33)
            .map(|i| Landmark::new(0.2 + self.offset, 0.1 + i as f64 * 0.02, 0.0))
            .collect();
        Ok(PoseDetection::Found(landmarks))
    }
}

fn video(duration_secs: f64) -> VideoSource {
    VideoSource {
        path: PathBuf::from("normalized.mp4"),
        duration_secs,
        fps: FPS,
        frame_count: (duration_secs * FPS) as u64,
        width: 4,
        height: 4,
    }
}

fn frames(source: &VideoSource) -> impl Iterator<Item = ReelcutResult<VideoFrame>> {
    let fps = source.fps;
    (0..source.frame_count).map(move |index| {
        Ok(VideoFrame {
            index,
            timestamp_secs: index as f64 / fps,
            width: 4,
            height: 4,
            data: vec![0; 48],
        })
    })
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn single_burst_becomes_one_buffered_segment() {
    let source = video(60.0);
    let detector = SegmentDetector::new(DetectionConfig {
        min_moving_frames: 5,
        max_stationary_frames: 10,
        ..Default::default()
    });
    let mut performer = Performer {
        bursts: vec![300..=450],
        offset: 0.0,
    };

    let report = detector.detect(frames(&source), &mut performer).unwrap();
    assert_eq!(report.raw_segments, vec![RawSegment::new(300, 450)]);
    assert_eq!(report.frames_sampled, 1800);

    let plan = detector.plan(&report.raw_segments, &source);
    assert_eq!(plan.buffered.len(), 1);
    assert!(approx(plan.buffered[0].start_secs, 8.0));
    assert!(approx(plan.buffered[0].end_secs, 18.0));
}

#[test]
fn close_bursts_merge_into_one_segment() {
    let source = video(60.0);
    let detector = SegmentDetector::new(DetectionConfig {
        min_moving_frames: 5,
        max_stationary_frames: 10,
        merge_gap_secs: 1.0,
        ..Default::default()
    });
    let mut performer = Performer {
        bursts: vec![300..=360, 375..=420],
        offset: 0.0,
    };

    let report = detector.detect(frames(&source), &mut performer).unwrap();
    assert_eq!(
        report.raw_segments,
        vec![RawSegment::new(300, 360), RawSegment::new(375, 420)]
    );

    let plan = detector.plan(&report.raw_segments, &source);
    assert_eq!(plan.merged.len(), 1);
    assert!(approx(plan.merged[0].start_secs, 10.0));
    assert!(approx(plan.merged[0].end_secs, 14.0));
}

#[test]
fn still_subject_yields_no_segments() {
    let source = video(20.0);
    let detector = SegmentDetector::with_defaults();
    let mut performer = Performer {
        bursts: vec![],
        offset: 0.0,
    };

    let report = detector.detect(frames(&source), &mut performer).unwrap();
    assert!(report.raw_segments.is_empty());
    assert!(detector.plan(&report.raw_segments, &source).buffered.is_empty());
}

#[test]
fn burst_at_video_start_clamps_to_zero() {
    let source = video(10.0);
    let detector = SegmentDetector::new(DetectionConfig {
        min_moving_frames: 3,
        max_stationary_frames: 5,
        ..Default::default()
    });
    let mut performer = Performer {
        bursts: vec![1..=30],
        offset: 0.0,
    };

    let report = detector.detect(frames(&source), &mut performer).unwrap();
    let plan = detector.plan(&report.raw_segments, &source);
    assert_eq!(plan.buffered.len(), 1);
    assert_eq!(plan.buffered[0].start_secs, 0.0);
    assert!(approx(plan.buffered[0].end_secs, 4.0));
}
