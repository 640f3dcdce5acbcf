use std::path::PathBuf;

use serde::Serialize;

/// The video player. Only the session issues commands to it.
pub trait PlaybackController {
    fn seek(&mut self, secs: f64) -> anyhow::Result<()>;
    fn play(&mut self) -> anyhow::Result<()>;
    fn pause(&mut self) -> anyhow::Result<()>;
    fn current_time(&self) -> f64;
}

/// Records the user's voice between start and stop signals.
pub trait AudioCapture {
    fn on_recording_start(&mut self) -> anyhow::Result<()>;
    fn on_recording_stop(&mut self, segment: usize) -> anyhow::Result<CapturedAudio>;
}

/// Live pitch from the microphone. `None` means unvoiced or silent.
pub trait PitchSource {
    fn next_hz(&mut self) -> Option<f32>;
}

/// Opaque handle to one captured take. The engine never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedAudio {
    pub segment: usize,
    pub path: Option<PathBuf>,
    pub sample_count: usize,
    pub duration_ms: u64,
}

impl CapturedAudio {
    pub fn empty(segment: usize) -> Self {
        Self {
            segment,
            path: None,
            sample_count: 0,
            duration_ms: 0,
        }
    }
}

/// Capture that keeps nothing. Used when takes are not being saved.
#[derive(Debug, Default)]
pub struct NullCapture {
    recording: bool,
}

impl NullCapture {
    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

impl AudioCapture for NullCapture {
    fn on_recording_start(&mut self) -> anyhow::Result<()> {
        self.recording = true;
        Ok(())
    }

    fn on_recording_stop(&mut self, segment: usize) -> anyhow::Result<CapturedAudio> {
        self.recording = false;
        Ok(CapturedAudio::empty(segment))
    }
}
