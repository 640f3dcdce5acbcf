use tracing::{debug, info};

use super::cancel::{TimerSlot, TimerTable};
use super::effect::{PlayerCommand, SideEffect};
use super::scheduler::IndexChange;
use super::segment::{Segment, SegmentTrack};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Millis;
use super::window::{RecordingWindow, StopReason, WindowGraph, WindowRequest, WindowState};

/// Default pre-roll before recording.
pub const COUNTDOWN_MS: u64 = 3000;

/// Shorter pre-roll variant used when re-recording.
pub const RECORDING_COUNTDOWN_MS: u64 = 2000;

/// Fraction of the countdown still remaining, from 1.0 down to exactly 0.0
/// once `elapsed_ms >= duration_ms`.
pub fn countdown_progress(elapsed_ms: u64, duration_ms: u64) -> f32 {
    if duration_ms == 0 || elapsed_ms >= duration_ms {
        return 0.0;
    }
    let remaining = (duration_ms - elapsed_ms) as f64 / duration_ms as f64;
    remaining.clamp(0.0, 1.0) as f32
}

/// Drives one segment window at a time through
/// `Idle -> Seeking -> CountingDown -> Recording -> Stopped`.
///
/// Every method returns the side effects to execute, in order. Only one
/// window exists at a time, so at most one can be `Recording`.
#[derive(Debug)]
pub struct RecordingStateMachine {
    countdown_ms: u64,
    window: Option<RecordingWindow>,
    timers: TimerTable,
}

impl RecordingStateMachine {
    pub fn new(countdown_ms: u64) -> Self {
        Self {
            countdown_ms,
            window: None,
            timers: TimerTable::new(),
        }
    }

    pub fn countdown_ms(&self) -> u64 {
        self.countdown_ms
    }

    pub fn window(&self) -> Option<&RecordingWindow> {
        self.window.as_ref()
    }

    pub fn state(&self) -> WindowState {
        self.window.as_ref().map(|w| w.state).unwrap_or_default()
    }

    pub fn timers(&self) -> &TimerTable {
        &self.timers
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_recording(&self) -> bool {
        self.state() == WindowState::Recording
    }

    /// Countdown fraction while `CountingDown`, computed from wall-clock time.
    pub fn countdown_fraction(&self, now: Millis) -> Option<f32> {
        let window = self.window.as_ref()?;
        if window.state != WindowState::CountingDown {
            return None;
        }
        let started = window.countdown_started?;
        Some(countdown_progress(now.since(started), self.countdown_ms))
    }

    /// Reacts to a boundary crossing: stops whatever is in flight, then
    /// starts a fresh cycle if the new index names a segment.
    pub fn on_index_changed(
        &mut self,
        change: IndexChange,
        track: &SegmentTrack,
        now: Millis,
        telemetry: &mut TelemetryRecorder,
    ) -> Vec<SideEffect> {
        let next = change.current.and_then(|i| track.get(i));
        let held = self.holds_player();
        let mut effects = self.force_stop(StopReason::Preempted, now, telemetry);

        match next {
            Some(segment) => effects.extend(self.begin(segment, now, telemetry)),
            // Nothing follows to take over the paused player.
            None if held => effects.extend(self.resume()),
            None => {}
        }

        effects
    }

    fn begin(&mut self, segment: &Segment, now: Millis, telemetry: &mut TelemetryRecorder) -> Vec<SideEffect> {
        self.window = Some(RecordingWindow::new(segment));
        self.advance(WindowRequest::Begin, now, telemetry);

        let effects = vec![
            SideEffect::Pause { segment: segment.index },
            SideEffect::Seek { segment: segment.index, to: segment.start },
        ];

        self.advance(WindowRequest::SeekIssued, now, telemetry);
        if let Some(window) = self.window.as_mut() {
            window.countdown_started = Some(now);
        }
        self.timers.arm(TimerSlot::Countdown, now, self.countdown_ms);

        info!(
            "Segment {} cycle: seek to {:.3}s, countdown {}ms",
            segment.index, segment.start, self.countdown_ms
        );
        effects
    }

    /// Fires whatever timers have expired by `now`.
    pub fn on_timers(&mut self, now: Millis, telemetry: &mut TelemetryRecorder) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        for slot in self.timers.take_expired(now) {
            match slot {
                TimerSlot::Countdown => effects.extend(self.start_recording(now, telemetry)),
                TimerSlot::RecordingWatchdog => {
                    effects.extend(self.stop(StopReason::Elapsed, WindowRequest::DurationElapsed, true, now, telemetry))
                }
            }
        }

        effects
    }

    fn start_recording(&mut self, now: Millis, telemetry: &mut TelemetryRecorder) -> Vec<SideEffect> {
        if !self.advance(WindowRequest::CountdownElapsed, now, telemetry) {
            return Vec::new();
        }
        let Some(window) = self.window.as_mut() else {
            return Vec::new();
        };

        window.recording_started = Some(now);
        let segment = window.segment;
        let duration_ms = window.duration_ms;
        self.timers.arm(TimerSlot::RecordingWatchdog, now, duration_ms);

        info!("Segment {} recording for {}ms", segment, duration_ms);
        vec![SideEffect::Play { segment }, SideEffect::StartRecording { segment }]
    }

    /// External stop request. Ignored unless a countdown or recording is live.
    /// Stopping a countdown hands playback back to the user.
    pub fn manual_stop(&mut self, now: Millis, telemetry: &mut TelemetryRecorder) -> Vec<SideEffect> {
        match self.state() {
            WindowState::CountingDown | WindowState::Recording => {
                let held = self.holds_player();
                let mut effects = self.stop(StopReason::Manual, WindowRequest::ManualStop, true, now, telemetry);
                if held {
                    effects.extend(self.resume());
                }
                effects
            }
            _ => {
                debug!("Manual stop ignored in state {:?}", self.state());
                Vec::new()
            }
        }
    }

    /// Strict-policy abort after a failed player command for `segment`.
    ///
    /// A failed `Play` means the capture start that follows it was never
    /// delivered, so no capture stop is emitted for it. Any other failure
    /// leaves the player paused on the countdown frame, so playback is
    /// resumed and the next boundary can still start a cycle.
    pub fn abort(
        &mut self,
        segment: usize,
        command: PlayerCommand,
        now: Millis,
        telemetry: &mut TelemetryRecorder,
    ) -> Vec<SideEffect> {
        let matches = self.window.as_ref().map(|w| w.segment == segment).unwrap_or(false);
        if !matches || !self.is_active() {
            debug!("Stale abort for segment {} ignored", segment);
            return Vec::new();
        }
        let capture_live = command != PlayerCommand::Play;
        let held = self.holds_player();
        let mut effects = self.stop(StopReason::Aborted, WindowRequest::ForceStop, capture_live, now, telemetry);
        if held && command != PlayerCommand::Play {
            effects.extend(self.resume());
        }
        effects
    }

    /// Stops any in-flight window for `reason`. No-op when nothing is live.
    ///
    /// Never resumes playback; callers that release a held player decide.
    pub fn force_stop(&mut self, reason: StopReason, now: Millis, telemetry: &mut TelemetryRecorder) -> Vec<SideEffect> {
        if !self.is_active() {
            return Vec::new();
        }
        self.stop(reason, WindowRequest::ForceStop, true, now, telemetry)
    }

    /// Replaces the track under a live window. A countdown in progress
    /// releases the paused player.
    pub fn replace_media(&mut self, now: Millis, telemetry: &mut TelemetryRecorder) -> Vec<SideEffect> {
        let held = self.holds_player();
        let mut effects = self.force_stop(StopReason::MediaReplaced, now, telemetry);
        if held {
            effects.extend(self.resume());
        }
        effects
    }

    /// True while the cycle keeps the player paused before recording.
    fn holds_player(&self) -> bool {
        matches!(self.state(), WindowState::Seeking | WindowState::CountingDown)
    }

    fn resume(&self) -> Vec<SideEffect> {
        match self.window.as_ref() {
            Some(window) => {
                info!("Segment {} released, resuming playback", window.segment);
                vec![SideEffect::Play { segment: window.segment }]
            }
            None => Vec::new(),
        }
    }

    fn stop(
        &mut self,
        reason: StopReason,
        request: WindowRequest,
        capture_live: bool,
        now: Millis,
        telemetry: &mut TelemetryRecorder,
    ) -> Vec<SideEffect> {
        let was_recording = self.is_recording();
        let cancelled: Vec<TimerSlot> = [TimerSlot::Countdown, TimerSlot::RecordingWatchdog]
            .into_iter()
            .filter(|slot| self.timers.cancel(*slot))
            .collect();

        if !self.advance(request, now, telemetry) {
            return Vec::new();
        }
        let Some(window) = self.window.as_mut() else {
            return Vec::new();
        };
        window.stopped_at = Some(now);
        window.stop_reason = Some(reason);
        let segment = window.segment;

        if !cancelled.is_empty() {
            telemetry.record(TelemetryEvent::TimersCancelled { segment, slots: cancelled });
        }

        let mut effects = Vec::new();
        if was_recording {
            let recorded_ms = window.recorded_ms(now).unwrap_or(0);
            telemetry.record(TelemetryEvent::RecordingClosed { segment, reason, recorded_ms });
            info!("Segment {} recording stopped ({:?}) after {}ms", segment, reason, recorded_ms);
            if capture_live {
                effects.push(SideEffect::StopRecording { segment, reason });
            }
        } else {
            debug!("Segment {} window stopped before recording ({:?})", segment, reason);
        }

        effects
    }

    /// Applies a graph transition to the current window. Returns false when
    /// the graph rejects it.
    fn advance(&mut self, request: WindowRequest, now: Millis, telemetry: &mut TelemetryRecorder) -> bool {
        let Some(window) = self.window.as_mut() else {
            return false;
        };
        let from = window.state;
        match WindowGraph::transition(from, request) {
            Some(to) => {
                window.state = to;
                telemetry.record(TelemetryEvent::WindowTransition {
                    segment: window.segment,
                    from,
                    to,
                    at: now,
                });
                debug!("Segment {} window {:?} -> {:?}", window.segment, from, to);
                true
            }
            None => {
                debug!("Segment {} window ignored {:?} in {:?}", window.segment, request, from);
                false
            }
        }
    }
}
