//! Hysteresis state machine that turns motion scores into raw segments.
//!
//! ```text
//!            moving_run reaches min_moving_frames
//!   IDLE ───────────────────────────────────────────▶ ACTIVE
//!    ▲                                                  │
//!    └──────────────────────────────────────────────────┘
//!         stationary_run reaches max_stationary_frames
//! ```
//!
//! A segment opens at the first frame of the qualifying moving run and closes
//! at the last frame before the qualifying stationary run. In `ACTIVE`, a
//! frame without a person is ambiguous and resets the stationary run, so a
//! short detection dropout never ends a segment.

use reelcut_media_model::segment::{FrameSample, RawSegment};

use crate::config::DetectionConfig;

/// Machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    Idle,
    Active { start_frame: u64 },
}

/// Classification of one sample against the movement threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Moving,
    Stationary,
    Absent,
}

/// Streaming segmenter. Construct a fresh one per video.
#[derive(Debug, Clone)]
pub struct SegmentStateMachine {
    movement_threshold: f64,
    min_moving_frames: u32,
    max_stationary_frames: u32,
    state: SegmenterState,
    moving_run: u32,
    moving_run_start: u64,
    stationary_run: u32,
    stationary_run_start: u64,
    last_frame: Option<u64>,
}

impl SegmentStateMachine {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            movement_threshold: config.movement_threshold,
            min_moving_frames: config.min_moving_frames.max(1),
            max_stationary_frames: config.max_stationary_frames.max(1),
            state: SegmenterState::Idle,
            moving_run: 0,
            moving_run_start: 0,
            stationary_run: 0,
            stationary_run_start: 0,
            last_frame: None,
        }
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    fn classify(&self, sample: &FrameSample) -> Motion {
        match sample.motion_score {
            Some(score) if score >= self.movement_threshold => Motion::Moving,
            Some(_) => Motion::Stationary,
            None => Motion::Absent,
        }
    }

    /// Feed the next sample. Returns a segment when this sample closes one.
    pub fn push(&mut self, sample: &FrameSample) -> Option<RawSegment> {
        self.last_frame = Some(sample.index);
        let motion = self.classify(sample);

        match self.state {
            SegmenterState::Idle => {
                if motion == Motion::Moving {
                    if self.moving_run == 0 {
                        self.moving_run_start = sample.index;
                    }
                    self.moving_run += 1;
                    if self.moving_run >= self.min_moving_frames {
                        self.state = SegmenterState::Active {
                            start_frame: self.moving_run_start,
                        };
                        self.moving_run = 0;
                        self.stationary_run = 0;
                    }
                } else {
                    self.moving_run = 0;
                }
                None
            }
            SegmenterState::Active { start_frame } => {
                if motion != Motion::Stationary {
                    self.stationary_run = 0;
                    return None;
                }

                if self.stationary_run == 0 {
                    self.stationary_run_start = sample.index;
                }
                self.stationary_run += 1;
                if self.stationary_run < self.max_stationary_frames {
                    return None;
                }

                // stationary_run_start > start_frame for monotonic frame indices.
                let end_frame = self.stationary_run_start.saturating_sub(1).max(start_frame);
                self.state = SegmenterState::Idle;
                self.moving_run = 0;
                self.stationary_run = 0;
                Some(RawSegment::new(start_frame, end_frame))
            }
        }
    }

    /// End of stream: close any open segment at the final frame.
    pub fn finish(self) -> Option<RawSegment> {
        match (self.state, self.last_frame) {
            (SegmenterState::Active { start_frame }, Some(last)) => {
                Some(RawSegment::new(start_frame, last))
            }
            _ => None,
        }
    }

    /// Run the machine over a complete sample sequence.
    pub fn segment_all<'a>(
        config: &DetectionConfig,
        samples: impl IntoIterator<Item = &'a FrameSample>,
    ) -> Vec<RawSegment> {
        let mut machine = Self::new(config);
        let mut segments: Vec<RawSegment> = samples
            .into_iter()
            .filter_map(|sample| machine.push(sample))
            .collect();
        segments.extend(machine.finish());
        segments
    }
}
