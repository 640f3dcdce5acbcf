use tracing::{debug, info, warn};

use super::effect::{PlayerCommand, SideEffect};
use super::event::Event;
use super::pitch::{Ingest, PitchSample, PitchSampleBuffer, PitchWindow};
use super::recording::RecordingStateMachine;
use super::scheduler::SegmentScheduler;
use super::segment::SegmentTrack;
use super::telemetry::event::{RejectKind, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Millis;
use super::window::{StopReason, WindowState};
use crate::config::EngineConfig;
use crate::media::MediaItem;

/// Engine core. Owns scheduler, state machine, pitch buffer and telemetry.
///
/// `tick_step` is synchronous and never performs I/O. Collaborators are
/// driven only through the returned side effects.
pub struct Reactor {
    pub scheduler: SegmentScheduler,
    pub machine: RecordingStateMachine,
    pub pitch: PitchSampleBuffer,
    pub telemetry: TelemetryRecorder,
    now: Millis,
}

impl Reactor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scheduler: SegmentScheduler::default(),
            machine: RecordingStateMachine::new(config.countdown_ms),
            pitch: PitchSampleBuffer::new(config.min_hz, config.max_hz, config.local_capacity),
            telemetry: TelemetryRecorder::new(),
            now: Millis::zero(),
        }
    }

    pub fn with_media(config: &EngineConfig, media: MediaItem) -> Self {
        let mut reactor = Self::new(config);
        reactor.load_media(media);
        reactor
    }

    /// One engine step at wall-clock `now`.
    ///
    /// Order: media loads, control requests, playback polls, pitch samples,
    /// teardown, then timers. Effects come back in execution order.
    pub fn tick_step(&mut self, now: Millis, events: Vec<Event>) -> Vec<SideEffect> {
        // Time never runs backwards inside the engine.
        self.now = self.now.max(now);
        let now = self.now;
        let mut effects = Vec::new();

        let mut loads = Vec::new();
        let mut controls = Vec::new();
        let mut polls = Vec::new();
        let mut samples = Vec::new();
        let mut teardown = false;

        for event in events {
            match event {
                Event::LoadMedia(media) => loads.push(media),
                Event::ManualStop | Event::CommandFailed { .. } => controls.push(event),
                Event::PlaybackTime(time) => polls.push(time),
                Event::Pitch(sample) => samples.push(sample),
                Event::Teardown => teardown = true,
            }
        }

        for media in loads {
            effects.extend(self.load_media(media));
        }

        for control in controls {
            match control {
                Event::ManualStop => effects.extend(self.machine.manual_stop(now, &mut self.telemetry)),
                Event::CommandFailed { segment, command } => {
                    effects.extend(self.machine.abort(segment, command, now, &mut self.telemetry))
                }
                _ => {}
            }
        }

        for time in polls {
            effects.extend(self.on_playback_time(time, now));
        }

        for sample in samples {
            self.ingest(sample);
        }

        if teardown {
            effects.extend(self.teardown());
            return effects;
        }

        effects.extend(self.machine.on_timers(now, &mut self.telemetry));
        effects
    }

    fn on_playback_time(&mut self, time: f64, now: Millis) -> Vec<SideEffect> {
        let Some(change) = self.scheduler.poll(time) else {
            return Vec::new();
        };

        info!("Boundary at {:.3}s: {:?} -> {:?}", time, change.previous, change.current);
        self.telemetry.record(TelemetryEvent::BoundaryCrossed {
            from: change.previous,
            to: change.current,
            at: now,
        });

        // A new attempt starts with an empty local series.
        self.pitch.reset_local();

        self.machine
            .on_index_changed(change, self.scheduler.track(), now, &mut self.telemetry)
    }

    /// Local pitch belongs to a recording attempt. Readings taken while the
    /// player sits paused on the countdown frame would all stamp the
    /// segment start, so they are dropped.
    fn ingest(&mut self, sample: PitchSample) {
        if !self.machine.is_recording() {
            self.telemetry.record(TelemetryEvent::PitchRejected { kind: RejectKind::OutsideRecording });
            return;
        }
        match self.pitch.ingest_local(sample) {
            Ingest::Accepted => {}
            Ingest::Unvoiced => self.telemetry.record(TelemetryEvent::PitchRejected { kind: RejectKind::Unvoiced }),
            Ingest::OutOfBand => {
                debug!("Pitch sample {:?} outside band", sample.hz);
                self.telemetry.record(TelemetryEvent::PitchRejected { kind: RejectKind::OutOfBand })
            }
        }
    }

    /// Replaces captions and reference pitch. A malformed caption list
    /// degrades to an empty track; the engine then never starts a cycle.
    pub fn load_media(&mut self, media: MediaItem) -> Vec<SideEffect> {
        let effects = self.machine.replace_media(self.now, &mut self.telemetry);

        let track = match media.track() {
            Ok(track) => track,
            Err(e) => {
                warn!("Rejecting caption sequence: {}", e);
                self.telemetry.record(TelemetryEvent::MediaRejected);
                SegmentTrack::empty()
            }
        };

        self.scheduler.replace(track);
        self.pitch.clear();
        self.pitch.load_reference(&media.reference_series());

        info!(
            "Media loaded: {} segments, {} voiced reference points",
            self.scheduler.track().len(),
            self.pitch.reference_len()
        );
        self.telemetry.record(TelemetryEvent::MediaLoaded {
            segments: self.scheduler.track().len(),
            reference_points: self.pitch.reference_len(),
        });

        effects
    }

    /// Cancels every timer and stops an in-flight recording.
    pub fn teardown(&mut self) -> Vec<SideEffect> {
        let effects = self.machine.force_stop(StopReason::Teardown, self.now, &mut self.telemetry);
        self.scheduler.reset();
        info!("Reactor torn down");
        effects
    }

    /// Records a player command failure reported by the driver.
    pub fn note_command_failure(&mut self, segment: usize, command: PlayerCommand) {
        self.telemetry.record(TelemetryEvent::CommandFailed { segment, command });
    }

    pub fn note_capture_failure(&mut self, segment: usize) {
        self.telemetry.record(TelemetryEvent::CaptureFailed { segment });
    }

    pub fn note_microphone_unavailable(&mut self) {
        self.telemetry.record(TelemetryEvent::MicrophoneUnavailable);
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn segments(&self) -> &SegmentTrack {
        self.scheduler.track()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.scheduler.current()
    }

    pub fn window_state(&self) -> WindowState {
        self.machine.state()
    }

    pub fn is_cycle_active(&self) -> bool {
        self.machine.is_active()
    }

    pub fn countdown_fraction(&self, now: Millis) -> Option<f32> {
        self.machine.countdown_fraction(now)
    }

    /// Local and reference pitch for `index`, re-based to the segment start.
    pub fn window_for_segment(&self, index: usize) -> Option<PitchWindow> {
        let segment = self.scheduler.track().get(index)?;
        Some(self.pitch.window_for(segment))
    }

    /// True once the clock has passed the last caption and nothing is live.
    pub fn is_finished(&self, playback_time: f64) -> bool {
        !self.machine.is_active() && self.scheduler.is_past_end(playback_time)
    }
}
