use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One caption unit of the source media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment used for index resolution.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// Immutable, validated caption sequence for one media item.
///
/// Indices are assigned from insertion order. The track is never edited in
/// place; loading new media builds a new track.
#[derive(Debug, Clone, Default)]
pub struct SegmentTrack {
    segments: Vec<Segment>,
}

impl SegmentTrack {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a track from `(start, end, text)` triples.
    ///
    /// Rejects non-finite bounds, `end <= start`, and any segment starting
    /// before the previous one ends.
    pub fn new<I, S>(spans: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (f64, f64, S)>,
        S: Into<String>,
    {
        let mut segments: Vec<Segment> = Vec::new();

        for (index, (start, end, text)) in spans.into_iter().enumerate() {
            if !start.is_finite() || !end.is_finite() {
                return Err(EngineError::InvalidSegment {
                    index,
                    reason: "non-finite bounds".to_string(),
                });
            }
            if end <= start {
                return Err(EngineError::InvalidSegment {
                    index,
                    reason: format!("end {end} is not after start {start}"),
                });
            }
            if let Some(prev) = segments.last() {
                if start < prev.end {
                    return Err(EngineError::InvalidSegment {
                        index,
                        reason: format!("starts at {start} before previous end {}", prev.end),
                    });
                }
            }
            segments.push(Segment {
                index,
                start,
                end,
                text: text.into(),
            });
        }

        Ok(Self { segments })
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// End of the last caption, if any.
    pub fn end_time(&self) -> Option<f64> {
        self.segments.last().map(|s| s.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_insertion_order() {
        let track = SegmentTrack::new(vec![(0.0, 1.0, "a"), (2.0, 3.0, "b")]).unwrap();
        assert_eq!(track.get(1).unwrap().index, 1);
        assert_eq!(track.end_time(), Some(3.0));
    }

    #[test]
    fn test_overlap_rejected() {
        let err = SegmentTrack::new(vec![(0.0, 2.0, "a"), (1.5, 3.0, "b")]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSegment { index: 1, .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(SegmentTrack::new(vec![(4.0, 4.0, "x")]).is_err());
        assert!(SegmentTrack::new(vec![(f64::NAN, 1.0, "x")]).is_err());
    }
}
