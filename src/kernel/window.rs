use serde::{Deserialize, Serialize};

use super::segment::Segment;
use super::time::{secs_to_ms, Millis};

/// Lifecycle of one segment's recording attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowState {
    /// Created, nothing issued yet.
    Idle,
    /// Seek back to the segment start has been issued.
    Seeking,
    /// Pre-roll countdown running; playback paused.
    CountingDown,
    /// Playback resumed and audio capture running.
    Recording,
    /// Terminal for this segment.
    Stopped,
}

impl Default for WindowState {
    fn default() -> Self {
        Self::Idle
    }
}

impl WindowState {
    /// States that own a live timer.
    pub fn is_active(&self) -> bool {
        matches!(self, WindowState::Seeking | WindowState::CountingDown | WindowState::Recording)
    }
}

/// Why a window reached `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// The segment's own duration elapsed since recording began.
    Elapsed,
    Manual,
    /// The active segment changed underneath the window.
    Preempted,
    /// A player command failed under the strict policy.
    Aborted,
    MediaReplaced,
    Teardown,
}

/// Requests that drive a window transition. The graph validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    Begin,
    SeekIssued,
    CountdownElapsed,
    DurationElapsed,
    ManualStop,
    ForceStop,
}

pub struct WindowGraph;

impl WindowGraph {
    /// Pure function: (Current State, Request) -> New State.
    /// Returns None if the transition is invalid and must be ignored.
    pub fn transition(current: WindowState, request: WindowRequest) -> Option<WindowState> {
        use WindowRequest::*;
        use WindowState::*;

        match (current, request) {
            (Idle, Begin) => Some(Seeking),
            (Seeking, SeekIssued) => Some(CountingDown),
            (CountingDown, CountdownElapsed) => Some(Recording),
            (Recording, DurationElapsed) => Some(Stopped),

            (CountingDown, ManualStop) | (Recording, ManualStop) => Some(Stopped),

            (Seeking, ForceStop) | (CountingDown, ForceStop) | (Recording, ForceStop) => Some(Stopped),

            _ => None,
        }
    }
}

/// Per-segment recording window.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingWindow {
    pub segment: usize,
    pub state: WindowState,
    /// Segment span, also the recording watchdog duration.
    pub duration_ms: u64,
    pub seek_to: f64,
    pub countdown_started: Option<Millis>,
    pub recording_started: Option<Millis>,
    pub stopped_at: Option<Millis>,
    pub stop_reason: Option<StopReason>,
}

impl RecordingWindow {
    pub fn new(segment: &Segment) -> Self {
        Self {
            segment: segment.index,
            state: WindowState::Idle,
            duration_ms: secs_to_ms(segment.duration_secs()),
            seek_to: segment.start,
            countdown_started: None,
            recording_started: None,
            stopped_at: None,
            stop_reason: None,
        }
    }

    /// Wall-clock time spent recording, if recording ever started.
    pub fn recorded_ms(&self, now: Millis) -> Option<u64> {
        let start = self.recording_started?;
        Some(self.stopped_at.unwrap_or(now).since(start))
    }
}
