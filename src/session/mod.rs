//! Session driver: owns the collaborators, samples the clocks, runs the
//! reactor and executes its side effects.

pub mod collaborators;
pub mod player;

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, FailurePolicy};
use crate::kernel::effect::SideEffect;
use crate::kernel::event::Event;
use crate::kernel::pitch::PitchSample;
use crate::kernel::reactor::Reactor;
use crate::kernel::time::Millis;
use crate::media::MediaItem;

pub use collaborators::{AudioCapture, CapturedAudio, NullCapture, PitchSource, PlaybackController};
pub use player::VirtualPlayer;

pub struct DubbingSession<P, C> {
    id: Uuid,
    config: EngineConfig,
    reactor: Reactor,
    player: P,
    capture: C,
    mic: Option<Box<dyn PitchSource>>,
    started: Instant,
    next_poll: Millis,
    next_mic: Millis,
    pending: Vec<Event>,
    takes: Vec<CapturedAudio>,
}

impl<P, C> DubbingSession<P, C>
where
    P: PlaybackController,
    C: AudioCapture,
{
    /// Builds a session. A missing microphone is reported once and the
    /// local pitch series simply stays empty.
    pub fn new(
        config: EngineConfig,
        media: MediaItem,
        player: P,
        capture: C,
        mic: Option<Box<dyn PitchSource>>,
    ) -> Self {
        let id = Uuid::new_v4();
        let mut reactor = Reactor::with_media(&config, media);

        if mic.is_none() {
            warn!("Session {}: microphone unavailable, pitch tracking disabled", id);
            reactor.note_microphone_unavailable();
        }

        Self {
            id,
            config,
            reactor,
            player,
            capture,
            mic,
            started: Instant::now(),
            next_poll: Millis::zero(),
            next_mic: Millis::zero(),
            pending: Vec::new(),
            takes: Vec::new(),
        }
    }

    /// Replaces the generated id, e.g. to match take file names.
    pub fn with_session_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn takes(&self) -> &[CapturedAudio] {
        &self.takes
    }

    /// Milliseconds since the session was created.
    pub fn elapsed(&self) -> Millis {
        Millis(self.started.elapsed().as_millis() as u64)
    }

    /// Queues a manual stop for the next step.
    pub fn request_stop(&mut self) {
        self.pending.push(Event::ManualStop);
    }

    /// Queues a media replacement for the next step.
    pub fn load_media(&mut self, media: MediaItem) {
        self.pending.push(Event::LoadMedia(media));
    }

    pub fn countdown_fraction(&self) -> Option<f32> {
        self.reactor.countdown_fraction(self.elapsed())
    }

    pub fn is_finished(&self) -> bool {
        self.reactor.is_finished(self.player.current_time())
    }

    pub fn step(&mut self) -> Vec<SideEffect> {
        let now = self.elapsed();
        self.step_at(now)
    }

    /// One driver step: sample what is due, run the reactor, execute effects.
    pub fn step_at(&mut self, now: Millis) -> Vec<SideEffect> {
        let mut events = std::mem::take(&mut self.pending);

        if now >= self.next_poll {
            events.push(Event::PlaybackTime(self.player.current_time()));
            self.next_poll = now.after(self.config.poll_interval_ms);
        }

        if now >= self.next_mic {
            if let Some(mic) = self.mic.as_mut() {
                let hz = mic.next_hz();
                events.push(Event::Pitch(PitchSample::local(self.player.current_time(), hz)));
            }
            self.next_mic = now.after(self.config.mic_interval_ms);
        }

        let effects = self.reactor.tick_step(now, events);
        self.execute(now, effects.clone());
        effects
    }

    fn execute(&mut self, now: Millis, effects: Vec<SideEffect>) {
        let mut queue: VecDeque<SideEffect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            let outcome = match &effect {
                SideEffect::Pause { .. } => self.player.pause(),
                SideEffect::Seek { to, .. } => self.player.seek(*to),
                SideEffect::Play { .. } => self.player.play(),
                SideEffect::StartRecording { segment } => {
                    if let Err(e) = self.capture.on_recording_start() {
                        warn!("Segment {}: capture start failed: {:#}", segment, e);
                        self.reactor.note_capture_failure(*segment);
                    }
                    Ok(())
                }
                SideEffect::StopRecording { segment, reason } => {
                    match self.capture.on_recording_stop(*segment) {
                        Ok(take) => {
                            info!("Segment {}: take captured ({:?}, {}ms)", segment, reason, take.duration_ms);
                            self.takes.push(take);
                        }
                        Err(e) => {
                            warn!("Segment {}: capture stop failed: {:#}", segment, e);
                            self.reactor.note_capture_failure(*segment);
                        }
                    }
                    Ok(())
                }
            };

            let Err(e) = outcome else { continue };
            let Some(command) = effect.player_command() else { continue };
            let segment = effect.segment();

            warn!("Segment {}: player {:?} failed: {:#}", segment, command, e);
            self.reactor.note_command_failure(segment, command);

            if self.config.failure_policy == FailurePolicy::Strict {
                // The rest of the batch belongs to the failed attempt.
                queue = self
                    .reactor
                    .tick_step(now, vec![Event::CommandFailed { segment, command }])
                    .into();
            }
        }
    }

    /// Cancels timers and closes an in-flight recording.
    pub fn shutdown(&mut self) {
        let now = self.elapsed();
        let effects = self.reactor.tick_step(now, vec![Event::Teardown]);
        self.execute(now, effects);
    }

    /// Cadence loop. Returns when `shutdown` fires or the media is done;
    /// either way the session is torn down before returning.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            "Session {} started: {} segments, tick {}ms, poll {}ms",
            self.id,
            self.reactor.segments().len(),
            self.config.tick_ms,
            self.config.poll_interval_ms
        );

        let mut cadence = interval(Duration::from_millis(self.config.tick_ms));
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session {}: shutdown requested", self.id);
                    break;
                }
                _ = cadence.tick() => {
                    self.step();
                    if self.is_finished() {
                        info!("Session {}: media finished", self.id);
                        break;
                    }
                }
            }
        }

        self.shutdown();
        info!("Session {} ended with {} takes", self.id, self.takes.len());
    }
}
