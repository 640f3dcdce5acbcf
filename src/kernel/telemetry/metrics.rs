use std::collections::VecDeque;

use super::event::{RejectKind, TelemetryEvent};
use crate::kernel::window::{StopReason, WindowState};

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub boundary_stats: BoundaryStats,
    pub window_stats: WindowStats,
    pub failure_stats: FailureStats,
    pub pitch_stats: PitchStats,
}

#[derive(Debug, Clone, Default)]
pub struct BoundaryStats {
    pub crossings: u64,
    pub media_loads: u64,
}

#[derive(Debug, Clone, Default)]
pub struct WindowStats {
    pub cycles_started: u64,
    pub recordings_started: u64,
    pub elapsed: u64,
    pub manual: u64,
    pub preempted: u64,
    pub aborted: u64,
    pub media_replaced: u64,
    pub teardown: u64,
    pub total_recorded_ms: u64,
    pub avg_recorded_ms: f64,
    /// Highest number of windows simultaneously in `Recording`.
    pub max_concurrent_recordings: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FailureStats {
    pub command_failures: u64,
    pub capture_failures: u64,
    pub media_rejected: u64,
    pub microphone_unavailable: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PitchStats {
    pub rejected_unvoiced: u64,
    pub rejected_out_of_band: u64,
    pub rejected_outside_recording: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    let mut recording_now: u64 = 0;
    let mut closed_recordings: u64 = 0;

    for event in events {
        match event {
            TelemetryEvent::BoundaryCrossed { .. } => snap.boundary_stats.crossings += 1,
            TelemetryEvent::WindowTransition { from, to, .. } => {
                if *from == WindowState::Idle && *to == WindowState::Seeking {
                    snap.window_stats.cycles_started += 1;
                }
                if *to == WindowState::Recording {
                    snap.window_stats.recordings_started += 1;
                    recording_now += 1;
                    snap.window_stats.max_concurrent_recordings =
                        snap.window_stats.max_concurrent_recordings.max(recording_now);
                }
                if *from == WindowState::Recording {
                    recording_now = recording_now.saturating_sub(1);
                }
            }
            TelemetryEvent::RecordingClosed { reason, recorded_ms, .. } => {
                match reason {
                    StopReason::Elapsed => snap.window_stats.elapsed += 1,
                    StopReason::Manual => snap.window_stats.manual += 1,
                    StopReason::Preempted => snap.window_stats.preempted += 1,
                    StopReason::Aborted => snap.window_stats.aborted += 1,
                    StopReason::MediaReplaced => snap.window_stats.media_replaced += 1,
                    StopReason::Teardown => snap.window_stats.teardown += 1,
                }
                snap.window_stats.total_recorded_ms += recorded_ms;
                closed_recordings += 1;
            }
            TelemetryEvent::CommandFailed { .. } => snap.failure_stats.command_failures += 1,
            TelemetryEvent::CaptureFailed { .. } => snap.failure_stats.capture_failures += 1,
            TelemetryEvent::PitchRejected { kind } => match kind {
                RejectKind::Unvoiced => snap.pitch_stats.rejected_unvoiced += 1,
                RejectKind::OutOfBand => snap.pitch_stats.rejected_out_of_band += 1,
                RejectKind::OutsideRecording => snap.pitch_stats.rejected_outside_recording += 1,
            },
            TelemetryEvent::MediaLoaded { .. } => snap.boundary_stats.media_loads += 1,
            TelemetryEvent::MediaRejected => snap.failure_stats.media_rejected += 1,
            TelemetryEvent::MicrophoneUnavailable => snap.failure_stats.microphone_unavailable += 1,
            TelemetryEvent::TimersCancelled { .. } => {}
        }
    }

    if closed_recordings > 0 {
        snap.window_stats.avg_recorded_ms =
            snap.window_stats.total_recorded_ms as f64 / closed_recordings as f64;
    }

    snap
}
