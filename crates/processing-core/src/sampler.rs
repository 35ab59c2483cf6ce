//! Frame sampling: turns decoded frames into per-frame motion scores.
//!
//! For every frame the pose estimator is queried once. Frames with landmarks
//! are scored by the mean Euclidean displacement of each landmark against
//! the most recent earlier frame that also had landmarks. Detection gaps do
//! not reset that baseline. The first frame with landmarks scores `0.0`
//! (present, not moving).

use reelcut_common::error::ReelcutResult;
use reelcut_media_model::pose::{Landmark, PoseDetection};
use reelcut_media_model::segment::FrameSample;
use reelcut_media_model::video::VideoFrame;

/// Per-frame pose-estimation capability.
///
/// Implementations may keep tracking state between calls, but the sampler
/// treats each call as independent. An `Err` for a frame is absorbed by the
/// sampler and the frame is scored as "no person".
pub trait PoseEstimator {
    fn estimate(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection>;
}

impl<E: PoseEstimator + ?Sized> PoseEstimator for Box<E> {
    fn estimate(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection> {
        (**self).estimate(frame)
    }
}

/// Mean per-landmark displacement between two detections.
///
/// Landmarks are paired by position; extra landmarks on either side are
/// ignored.
pub fn mean_landmark_displacement(current: &[Landmark], previous: &[Landmark]) -> f64 {
    let pairs = current.len().min(previous.len());
    if pairs == 0 {
        return 0.0;
    }

    let total: f64 = current
        .iter()
        .zip(previous)
        .map(|(curr, prev)| curr.distance(prev))
        .sum();

    total / pairs as f64
}

/// Lazy, single-pass stream of [`FrameSample`]s over a frame source.
pub struct FrameSampler<'a, I, E: ?Sized> {
    frames: I,
    estimator: &'a mut E,
    baseline: Option<Vec<Landmark>>,
    frames_sampled: u64,
    frames_with_pose: u64,
    pose_failures: u64,
}

impl<'a, I, E> FrameSampler<'a, I, E>
where
    I: Iterator<Item = ReelcutResult<VideoFrame>>,
    E: PoseEstimator + ?Sized,
{
    pub fn new(frames: I, estimator: &'a mut E) -> Self {
        Self {
            frames,
            estimator,
            baseline: None,
            frames_sampled: 0,
            frames_with_pose: 0,
            pose_failures: 0,
        }
    }

    /// Frames consumed so far.
    pub fn frames_sampled(&self) -> u64 {
        self.frames_sampled
    }

    /// Frames in which a person was detected.
    pub fn frames_with_pose(&self) -> u64 {
        self.frames_with_pose
    }

    /// Frames where the estimator returned an error.
    pub fn pose_failures(&self) -> u64 {
        self.pose_failures
    }

    fn score(&mut self, frame: &VideoFrame) -> Option<f64> {
        let detection = match self.estimator.estimate(frame) {
            Ok(detection) => detection,
            Err(err) => {
                self.pose_failures += 1;
                tracing::debug!(frame = frame.index, error = %err, "Pose estimation failed, treating frame as empty");
                PoseDetection::NotFound
            }
        };

        let PoseDetection::Found(landmarks) = detection else {
            return None;
        };
        if landmarks.is_empty() {
            return None;
        }

        self.frames_with_pose += 1;
        let score = self
            .baseline
            .as_deref()
            .map(|previous| mean_landmark_displacement(&landmarks, previous))
            .unwrap_or(0.0);
        self.baseline = Some(landmarks);
        Some(score)
    }
}

impl<'a, I, E> Iterator for FrameSampler<'a, I, E>
where
    I: Iterator<Item = ReelcutResult<VideoFrame>>,
    E: PoseEstimator + ?Sized,
{
    type Item = ReelcutResult<FrameSample>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = match self.frames.next()? {
            Ok(frame) => frame,
            Err(err) => return Some(Err(err)),
        };

        self.frames_sampled += 1;
        let motion_score = self.score(&frame);
        Some(Ok(FrameSample::new(
            frame.index,
            frame.timestamp_secs,
            motion_score,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_common::error::ReelcutError;

    /// Replays a fixed detection per frame index.
    struct Scripted {
        script: Vec<Option<Vec<Landmark>>>,
        fail_on: Vec<u64>,
    }

    impl PoseEstimator for Scripted {
        fn estimate(&mut self, frame: &VideoFrame) -> ReelcutResult<PoseDetection> {
            if self.fail_on.contains(&frame.index) {
                return Err(ReelcutError::pose("model crashed"));
            }
            Ok(match self.script.get(frame.index as usize).cloned().flatten() {
                Some(landmarks) => PoseDetection::Found(landmarks),
                None => PoseDetection::NotFound,
            })
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

    fn pose_at(x: f64) -> Option<Vec<Landmark>> {
        Some(vec![Landmark::new(x, 0.5, 0.0), Landmark::new(x, 0.7, 0.0)])
    }

    #[test]
    fn test_displacement_is_mean_distance() {
        let prev = [Landmark::new(0.0, 0.0, 0.0), Landmark::new(1.0, 1.0, 0.0)];
        let curr = [Landmark::new(0.3, 0.4, 0.0), Landmark::new(1.0, 1.0, 0.0)];
        assert!((mean_landmark_displacement(&curr, &prev) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_first_detection_scores_zero() {
        let mut estimator = Scripted {
            script: vec![None, pose_at(0.5)],
            fail_on: vec![],
        };
        let samples: Vec<_> = FrameSampler::new(frames(2), &mut estimator)
            .collect::<ReelcutResult<_>>()
            .unwrap();
        assert!(!samples[0].is_present());
        assert_eq!(samples[1].motion_score, Some(0.0));
    }

    #[test]
    fn test_gap_keeps_previous_baseline() {
        let mut estimator = Scripted {
            script: vec![pose_at(0.1), None, None, pose_at(0.4)],
            fail_on: vec![],
        };
        let samples: Vec<_> = FrameSampler::new(frames(4), &mut estimator)
            .collect::<ReelcutResult<_>>()
            .unwrap();
        assert_eq!(samples[1].motion_score, None);
        let score = samples[3].motion_score.unwrap();
        assert!((score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_estimator_error_is_absorbed() {
        let mut estimator = Scripted {
            script: vec![pose_at(0.1), pose_at(0.2), pose_at(0.3)],
            fail_on: vec![1],
        };
        let mut sampler = FrameSampler::new(frames(3), &mut estimator);
        let samples: Vec<_> = sampler.by_ref().collect::<ReelcutResult<_>>().unwrap();
        assert_eq!(samples[1].motion_score, None);
        assert!((samples[2].motion_score.unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(sampler.pose_failures(), 1);
        assert_eq!(sampler.frames_sampled(), 3);
        assert_eq!(sampler.frames_with_pose(), 2);
    }

    #[test]
    fn test_decode_error_is_passed_through() {
        let mut estimator = Scripted {
            script: vec![],
            fail_on: vec![],
        };
        let source = frames(1).chain(std::iter::once(Err(ReelcutError::decode("truncated"))));
        let result: ReelcutResult<Vec<_>> = FrameSampler::new(source, &mut estimator).collect();
        assert!(matches!(result, Err(ReelcutError::Decode { .. })));
    }
}
