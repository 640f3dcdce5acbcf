use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::segment::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchOrigin {
    /// Live microphone.
    Local,
    /// Ground truth extracted from the source performance.
    Reference,
}

/// A single pitch reading on the media clock. `hz == None` is unvoiced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchSample {
    pub time: f64,
    pub hz: Option<f32>,
    pub origin: PitchOrigin,
}

impl PitchSample {
    pub fn local(time: f64, hz: Option<f32>) -> Self {
        Self { time, hz, origin: PitchOrigin::Local }
    }

    pub fn reference(time: f64, hz: Option<f32>) -> Self {
        Self { time, hz, origin: PitchOrigin::Reference }
    }
}

/// A voiced point, re-based onto the segment's relative axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchPoint {
    pub time: f64,
    pub hz: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PitchWindow {
    pub local: Vec<PitchPoint>,
    pub reference: Vec<PitchPoint>,
}

/// Outcome of `ingest_local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Accepted,
    Unvoiced,
    OutOfBand,
}

pub const DEFAULT_MIN_HZ: f32 = 80.0;
pub const DEFAULT_MAX_HZ: f32 = 1000.0;
pub const DEFAULT_LOCAL_CAPACITY: usize = 50;

/// Local and reference pitch series, viewed through the active segment.
#[derive(Debug, Clone)]
pub struct PitchSampleBuffer {
    local: VecDeque<PitchPoint>,
    reference: Vec<PitchPoint>,
    min_hz: f32,
    max_hz: f32,
    local_capacity: usize,
}

impl Default for PitchSampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_HZ, DEFAULT_MAX_HZ, DEFAULT_LOCAL_CAPACITY)
    }
}

impl PitchSampleBuffer {
    pub fn new(min_hz: f32, max_hz: f32, local_capacity: usize) -> Self {
        Self {
            local: VecDeque::with_capacity(local_capacity),
            reference: Vec::new(),
            min_hz,
            max_hz,
            local_capacity: local_capacity.max(1),
        }
    }

    /// Appends a microphone reading. Unvoiced and out-of-band readings are
    /// never stored. Oldest points are dropped past capacity.
    pub fn ingest_local(&mut self, sample: PitchSample) -> Ingest {
        let hz = match sample.hz {
            Some(hz) => hz,
            None => return Ingest::Unvoiced,
        };
        if !hz.is_finite() || !sample.time.is_finite() || hz < self.min_hz || hz > self.max_hz {
            return Ingest::OutOfBand;
        }

        if self.local.len() >= self.local_capacity {
            self.local.pop_front();
        }
        self.local.push_back(PitchPoint { time: sample.time, hz });
        Ingest::Accepted
    }

    /// Replaces the reference series. Unvoiced points are dropped here so
    /// they are never plotted as zero.
    pub fn load_reference(&mut self, series: &[PitchSample]) {
        self.reference = series
            .iter()
            .filter_map(|s| match s.hz {
                Some(hz) if hz.is_finite() && hz > 0.0 && s.time.is_finite() => {
                    Some(PitchPoint { time: s.time, hz })
                }
                _ => None,
            })
            .collect();
    }

    /// New recording attempt: local series starts empty, reference kept.
    pub fn reset_local(&mut self) {
        self.local.clear();
    }

    pub fn clear(&mut self) {
        self.local.clear();
        self.reference.clear();
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn reference_len(&self) -> usize {
        self.reference.len()
    }

    /// Both series clipped to `[start, end]` (inclusive) and re-based to
    /// start at zero.
    pub fn window_for(&self, segment: &Segment) -> PitchWindow {
        PitchWindow {
            local: rebase(self.local.iter(), segment),
            reference: rebase(self.reference.iter(), segment),
        }
    }
}

fn rebase<'a>(points: impl Iterator<Item = &'a PitchPoint>, segment: &Segment) -> Vec<PitchPoint> {
    points
        .filter(|p| p.time >= segment.start && p.time <= segment.end)
        .map(|p| PitchPoint { time: p.time - segment.start, hz: p.hz })
        .collect()
}
