use serde::{Deserialize, Serialize};

use crate::kernel::cancel::TimerSlot;
use crate::kernel::effect::PlayerCommand;
use crate::kernel::time::Millis;
use crate::kernel::window::{StopReason, WindowState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    BoundaryCrossed {
        from: Option<usize>,
        to: Option<usize>,
        at: Millis,
    },

    WindowTransition {
        segment: usize,
        from: WindowState,
        to: WindowState,
        at: Millis,
    },

    RecordingClosed {
        segment: usize,
        reason: StopReason,
        recorded_ms: u64,
    },

    TimersCancelled {
        segment: usize,
        slots: Vec<TimerSlot>,
    },

    CommandFailed {
        segment: usize,
        command: PlayerCommand,
    },

    CaptureFailed {
        segment: usize,
    },

    PitchRejected {
        kind: RejectKind,
    },

    MediaLoaded {
        segments: usize,
        reference_points: usize,
    },

    /// Caption sequence failed validation; engine runs with an empty track.
    MediaRejected,

    MicrophoneUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectKind {
    Unvoiced,
    OutOfBand,
    /// Arrived while no window was recording.
    OutsideRecording,
}
