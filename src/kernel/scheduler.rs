use super::segment::SegmentTrack;

/// A boundary crossing between two polls of the playback clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

/// Maps continuous playback time onto the discrete caption index.
///
/// Only `poll` moves the remembered index, so a change is reported once no
/// matter how often the clock is sampled.
#[derive(Debug, Default)]
pub struct SegmentScheduler {
    track: SegmentTrack,
    last: Option<usize>,
}

impl SegmentScheduler {
    pub fn new(track: SegmentTrack) -> Self {
        Self { track, last: None }
    }

    pub fn track(&self) -> &SegmentTrack {
        &self.track
    }

    /// Swaps in a new media item's captions and forgets the previous index.
    pub fn replace(&mut self, track: SegmentTrack) {
        self.track = track;
        self.last = None;
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Index reported by the most recent poll.
    pub fn current(&self) -> Option<usize> {
        self.last
    }

    /// Pure lookup: `[start, end)` hit, else the preceding segment while
    /// inside a gap, else `None` before the first or past the last.
    pub fn resolve_active_index(&self, time: f64) -> Option<usize> {
        if !time.is_finite() || self.track.is_empty() {
            return None;
        }

        // Number of segments that have started by `time`.
        let started = self
            .track
            .as_slice()
            .partition_point(|s| s.start <= time);
        if started == 0 {
            return None;
        }

        let candidate = started - 1;
        let segment = self.track.get(candidate)?;
        if time < segment.end {
            return Some(candidate);
        }

        // Gap: the next segment exists but has not started yet.
        if candidate + 1 < self.track.len() {
            Some(candidate)
        } else {
            None
        }
    }

    /// Samples the clock. Returns the crossing if the resolved index differs
    /// from the previous poll.
    pub fn poll(&mut self, time: f64) -> Option<IndexChange> {
        let resolved = self.resolve_active_index(time);
        if resolved == self.last {
            return None;
        }

        let change = IndexChange {
            previous: self.last,
            current: resolved,
        };
        self.last = resolved;
        Some(change)
    }

    /// True once the clock has moved past the final caption.
    pub fn is_past_end(&self, time: f64) -> bool {
        match self.track.end_time() {
            Some(end) => time >= end,
            None => true,
        }
    }
}
