//! Media items: the caption sequence and reference pitch series for one clip.

pub mod loader;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::kernel::pitch::PitchSample;
use crate::kernel::segment::SegmentTrack;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub time: f64,
    pub hz: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub segments: Vec<SegmentSpec>,
    #[serde(default)]
    pub reference: Vec<ReferencePoint>,
}

impl MediaItem {
    pub fn new(segments: Vec<SegmentSpec>, reference: Vec<ReferencePoint>) -> Self {
        Self { segments, reference }
    }

    /// Convenience for building captions from `(start, end, text)` triples.
    pub fn from_spans<S: Into<String>>(spans: impl IntoIterator<Item = (f64, f64, S)>) -> Self {
        Self {
            segments: spans
                .into_iter()
                .map(|(start, end, text)| SegmentSpec { start, end, text: text.into() })
                .collect(),
            reference: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: Vec<ReferencePoint>) -> Self {
        self.reference = reference;
        self
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validated caption track.
    pub fn track(&self) -> EngineResult<SegmentTrack> {
        SegmentTrack::new(self.segments.iter().map(|s| (s.start, s.end, s.text.clone())))
    }

    pub fn reference_series(&self) -> Vec<PitchSample> {
        self.reference
            .iter()
            .map(|p| PitchSample::reference(p.time, p.hz))
            .collect()
    }
}
