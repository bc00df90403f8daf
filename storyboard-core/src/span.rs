//! Conversion of timeline markers into contiguous spans

use crate::{Error, Marker, Result};
use log::debug;

/// Label given to the implicit span that opens the frame range
pub const START_LABEL: &str = "start";

/// A contiguous run of frames attributed to the marker that begins it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// First frame of the span
    pub frame: i64,
    /// Label of the originating marker
    pub name: String,
    /// Number of frames covered
    pub length: i64,
}

impl Span {
    /// Creates a new span
    pub fn new(frame: i64, name: impl Into<String>, length: i64) -> Self {
        Self {
            frame,
            name: name.into(),
            length,
        }
    }

    /// Returns the frame one past the end of this span, saturating at the frame limits
    pub fn end(&self) -> i64 {
        self.frame.saturating_add(self.length)
    }

    /// Checks if the span covers no frames
    pub fn is_empty(&self) -> bool {
        self.length <= 0
    }
}

/// Builds the spans partitioning `[frame_start, frame_end]` from a set of markers.
///
/// Markers outside the range are ignored. The remaining markers are sorted by
/// frame, keeping the input order for markers on the same frame. When the
/// earliest marker comes after `frame_start`, a synthetic [`START_LABEL`] span
/// covers the gap. Every span lasts until the next marker; the last one lasts
/// until `frame_end`.
///
/// A range without markers yields no spans at all.
pub fn build_spans(markers: &[Marker], frame_start: i64, frame_end: i64) -> Result<Vec<Span>> {
    if frame_end < frame_start {
        return Err(Error::InvalidRange {
            start: frame_start,
            end: frame_end,
        });
    }

    let mut in_range: Vec<&Marker> = markers
        .iter()
        .filter(|m| m.frame >= frame_start && m.frame <= frame_end)
        .collect();

    if in_range.is_empty() {
        debug!(
            "No markers within frames {}..={}, nothing to build",
            frame_start, frame_end
        );
        return Ok(Vec::new());
    }

    // sort_by_key is stable, so markers sharing a frame keep their input order
    in_range.sort_by_key(|m| m.frame);

    let mut starts: Vec<(i64, &str)> = Vec::with_capacity(in_range.len() + 1);
    if in_range[0].frame > frame_start {
        starts.push((frame_start, START_LABEL));
    }
    starts.extend(in_range.iter().map(|m| (m.frame, m.name.as_str())));

    let spans = starts
        .iter()
        .enumerate()
        .map(|(i, &(frame, name))| {
            let next = starts.get(i + 1).map_or(frame_end, |&(f, _)| f);
            let length = next
                .checked_sub(frame)
                .ok_or(Error::SpanOverflow { frame, next })?;
            Ok(Span::new(frame, name, length))
        })
        .collect::<Result<Vec<Span>>>()?;

    debug!(
        "Built {} spans from {} markers over frames {}..={}",
        spans.len(),
        markers.len(),
        frame_start,
        frame_end
    );

    Ok(spans)
}

/// Drops spans that cover no frames
pub fn non_empty(spans: Vec<Span>) -> Vec<Span> {
    spans.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(list: &[(i64, &str)]) -> Vec<Marker> {
        list.iter().map(|&(f, n)| Marker::new(f, n)).collect()
    }

    fn assert_partition(spans: &[Span], frame_start: i64, frame_end: i64) {
        assert_eq!(spans.first().unwrap().frame, frame_start);
        assert_eq!(spans.last().unwrap().end(), frame_end);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end(), pair[1].frame);
        }
        let total: i64 = spans.iter().map(|s| s.length).sum();
        assert_eq!(total, frame_end - frame_start);
    }

    #[test]
    fn test_example_scenario() {
        let spans = build_spans(&markers(&[(10, "A"), (25, "B")]), 0, 30).unwrap();

        assert_eq!(
            spans,
            vec![
                Span::new(0, "start", 10),
                Span::new(10, "A", 15),
                Span::new(25, "B", 5),
            ]
        );
        assert_partition(&spans, 0, 30);
    }

    #[test]
    fn test_no_synthetic_start_when_marker_on_first_frame() {
        let spans = build_spans(&markers(&[(1, "open"), (50, "end")]), 1, 100).unwrap();

        assert_eq!(spans[0], Span::new(1, "open", 49));
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.name != START_LABEL));
        assert_partition(&spans, 1, 100);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let spans = build_spans(&markers(&[(40, "c"), (5, "a"), (20, "b")]), 0, 60).unwrap();

        let frames: Vec<i64> = spans.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 5, 20, 40]);
        assert_partition(&spans, 0, 60);
    }

    #[test]
    fn test_markers_outside_range_are_ignored() {
        let spans = build_spans(
            &markers(&[(-5, "before"), (12, "in"), (101, "after")]),
            0,
            100,
        )
        .unwrap();

        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.name != "before" && s.name != "after"));
        assert_partition(&spans, 0, 100);
    }

    #[test]
    fn test_duplicate_frames_keep_input_order() {
        let spans = build_spans(&markers(&[(10, "first"), (10, "second")]), 10, 20).unwrap();

        assert_eq!(
            spans,
            vec![Span::new(10, "first", 0), Span::new(10, "second", 10)]
        );
        assert_partition(&spans, 10, 20);
    }

    #[test]
    fn test_marker_on_last_frame_has_zero_length() {
        let spans = build_spans(&markers(&[(0, "a"), (30, "z")]), 0, 30).unwrap();

        assert_eq!(spans.last().unwrap(), &Span::new(30, "z", 0));
        assert_partition(&spans, 0, 30);
    }

    #[test]
    fn test_marker_named_start_on_first_frame_is_kept() {
        let spans = build_spans(&markers(&[(0, "start"), (8, "b")]), 0, 16).unwrap();

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], Span::new(0, "start", 8));
    }

    #[test]
    fn test_no_markers_in_range_is_empty() {
        assert!(build_spans(&[], 0, 100).unwrap().is_empty());
        assert!(build_spans(&markers(&[(500, "late")]), 0, 100)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_range() {
        let err = build_spans(&markers(&[(5, "a")]), 10, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { start: 10, end: 0 }));
    }

    #[test]
    fn test_span_longer_than_frame_limit() {
        let err = build_spans(&markers(&[(i64::MIN, "a")]), i64::MIN, i64::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::SpanOverflow {
                frame: i64::MIN,
                next: i64::MAX
            }
        ));
    }

    #[test]
    fn test_wide_range_within_limits() {
        let spans = build_spans(&markers(&[(0, "mid")]), -1_000_000_000_000, 1_000_000_000_000)
            .unwrap();

        assert_eq!(spans[0], Span::new(-1_000_000_000_000, "start", 1_000_000_000_000));
        assert_partition(&spans, -1_000_000_000_000, 1_000_000_000_000);
    }

    #[test]
    fn test_end_saturates() {
        assert_eq!(Span::new(i64::MAX - 1, "a", 10).end(), i64::MAX);
    }

    #[test]
    fn test_single_frame_range() {
        let spans = build_spans(&markers(&[(7, "only")]), 7, 7).unwrap();
        assert_eq!(spans, vec![Span::new(7, "only", 0)]);
    }

    #[test]
    fn test_non_empty_drops_degenerate_spans() {
        let spans = build_spans(&markers(&[(0, "a"), (0, "b"), (10, "c")]), 0, 10).unwrap();
        let kept = non_empty(spans);

        let names: Vec<&str> = kept.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }
}
