//! Interval passes run after segmentation.
//!
//! 1. **Merge** raw segments separated by less than `merge_gap_secs`.
//! 2. **Buffer** each merged span by the pre/post padding, clamped to the
//!    video duration.
//! 3. **Re-merge** with a zero gap, because padding can make previously
//!    distinct spans overlap. A span that ends up inside its neighbor is
//!    absorbed by it. Spans that merely touch stay separate.

use reelcut_media_model::segment::{BufferedSegment, MergedSegment, TimeSpan};

/// Merge spans (sorted by start) whose gap is smaller than `gap_secs`.
///
/// Single left-to-right sweep; the accumulator keeps the furthest end seen.
pub fn merge_spans(spans: &[TimeSpan], gap_secs: f64) -> Vec<TimeSpan> {
    let Some((first, rest)) = spans.split_first() else {
        return Vec::new();
    };

    let mut merged = Vec::with_capacity(spans.len());
    let mut current = *first;

    for next in rest {
        if current.gap_to(next) < gap_secs {
            current.end_secs = current.end_secs.max(next.end_secs);
        } else {
            merged.push(current);
            current = *next;
        }
    }

    merged.push(current);
    merged
}

/// Pad, clamp to `[0, duration_secs]`, drop empty spans, then re-merge
/// overlaps.
pub fn buffer_and_clamp(
    segments: &[MergedSegment],
    pre_buffer_secs: f64,
    post_buffer_secs: f64,
    duration_secs: f64,
) -> Vec<BufferedSegment> {
    let padded: Vec<TimeSpan> = segments
        .iter()
        .map(|segment| {
            TimeSpan::new(
                (segment.start_secs - pre_buffer_secs).max(0.0),
                (segment.end_secs + post_buffer_secs).min(duration_secs),
            )
        })
        .filter(|span| span.end_secs > span.start_secs)
        .collect();

    merge_spans(&padded, 0.0)
}
