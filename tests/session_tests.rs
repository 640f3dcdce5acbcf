use std::collections::VecDeque;
use std::time::Duration;

use dubsync::config::{EngineConfig, FailurePolicy};
use dubsync::kernel::effect::PlayerCommand;
use dubsync::kernel::time::Millis;
use dubsync::kernel::window::{StopReason, WindowState};
use dubsync::media::MediaItem;
use dubsync::session::{
    AudioCapture, CapturedAudio, DubbingSession, PitchSource, PlaybackController, VirtualPlayer,
};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
enum CaptureCall {
    Start,
    Stop(usize),
}

/// Capture stub that only logs the calls it receives.
#[derive(Debug, Default)]
struct LogCapture {
    calls: Vec<CaptureCall>,
    fail_start: bool,
}

impl AudioCapture for LogCapture {
    fn on_recording_start(&mut self) -> anyhow::Result<()> {
        self.calls.push(CaptureCall::Start);
        if self.fail_start {
            anyhow::bail!("input device busy");
        }
        Ok(())
    }

    fn on_recording_stop(&mut self, segment: usize) -> anyhow::Result<CapturedAudio> {
        self.calls.push(CaptureCall::Stop(segment));
        Ok(CapturedAudio::empty(segment))
    }
}

/// Player whose seek can be made to fail.
struct FlakyPlayer {
    inner: VirtualPlayer,
    fail_seek: bool,
}

impl PlaybackController for FlakyPlayer {
    fn seek(&mut self, secs: f64) -> anyhow::Result<()> {
        if self.fail_seek {
            anyhow::bail!("media not seekable");
        }
        self.inner.seek(secs)
    }

    fn play(&mut self) -> anyhow::Result<()> {
        self.inner.play()
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.inner.pause()
    }

    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }
}

struct ScriptedPitch(VecDeque<Option<f32>>);

impl PitchSource for ScriptedPitch {
    fn next_hz(&mut self) -> Option<f32> {
        self.0.pop_front().flatten()
    }
}

fn two_segments() -> MediaItem {
    MediaItem::from_spans(vec![(0.0, 3.0, "A"), (3.0, 5.0, "B")])
}

#[tokio::test(start_paused = true)]
async fn test_run_drives_both_segments_to_completion() {
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::playing_from(0.0),
        LogCapture::default(),
        None,
    );

    session.run(CancellationToken::new()).await;

    assert_eq!(
        session.capture().calls,
        vec![
            CaptureCall::Start,
            CaptureCall::Stop(0),
            CaptureCall::Start,
            CaptureCall::Stop(1),
        ]
    );
    assert_eq!(session.takes().len(), 2);

    let seeks: Vec<f64> = session
        .player()
        .history()
        .iter()
        .filter(|(cmd, _)| *cmd == PlayerCommand::Seek)
        .map(|(_, pos)| *pos)
        .collect();
    assert_eq!(seeks, vec![0.0, 3.0]);

    // Every seek is preceded by a pause.
    let history = session.player().history();
    for (i, (cmd, _)) in history.iter().enumerate() {
        if *cmd == PlayerCommand::Seek {
            assert_eq!(history[i - 1].0, PlayerCommand::Pause);
        }
    }

    let snap = session.reactor().telemetry.snapshot();
    assert_eq!(snap.boundary_stats.crossings, 3);
    assert_eq!(snap.window_stats.recordings_started, 2);
    assert_eq!(snap.window_stats.max_concurrent_recordings, 1);
    assert_eq!(snap.failure_stats.microphone_unavailable, 1);
    assert!(session.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_tears_down() {
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::playing_from(0.0),
        LogCapture::default(),
        None,
    );
    let token = CancellationToken::new();
    token.cancel();

    session.run(token).await;

    assert!(!session.reactor().is_cycle_active());
    assert!(session.capture().calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_strict_policy_aborts_on_failed_seek() {
    let config = EngineConfig {
        failure_policy: FailurePolicy::Strict,
        ..EngineConfig::default()
    };
    let player = FlakyPlayer { inner: VirtualPlayer::paused_at(0.0), fail_seek: true };
    let mut session = DubbingSession::new(config, two_segments(), player, LogCapture::default(), None);

    session.step_at(Millis(0));
    assert_eq!(session.reactor().window_state(), WindowState::Stopped);
    assert_eq!(
        session.reactor().machine.window().and_then(|w| w.stop_reason),
        Some(StopReason::Aborted)
    );

    // Countdown never completes and nothing is recorded, but the player is
    // released from the countdown pause.
    session.step_at(Millis(4000));
    assert!(session.capture().calls.is_empty());
    assert!(session.player().inner.is_playing());

    let snap = session.reactor().telemetry.snapshot();
    assert_eq!(snap.failure_stats.command_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_strict_run_finishes_when_every_seek_fails() {
    let config = EngineConfig {
        failure_policy: FailurePolicy::Strict,
        ..EngineConfig::default()
    };
    let player = FlakyPlayer { inner: VirtualPlayer::playing_from(0.0), fail_seek: true };
    let mut session = DubbingSession::new(config, two_segments(), player, LogCapture::default(), None);

    timeout(Duration::from_secs(60), session.run(CancellationToken::new()))
        .await
        .expect("run returns once the media is over");

    assert!(session.is_finished());
    assert!(session.capture().calls.is_empty());

    let telemetry = &session.reactor().telemetry;
    assert_eq!(telemetry.boundary_crossings().len(), 3);
    assert_eq!(
        telemetry.window_path(1),
        vec![WindowState::Idle, WindowState::Seeking, WindowState::CountingDown, WindowState::Stopped]
    );
    assert_eq!(telemetry.snapshot().failure_stats.command_failures, 2);
    assert_eq!(session.player().inner.history().last(), Some(&(PlayerCommand::Play, 3.0)));
}

#[tokio::test(start_paused = true)]
async fn test_run_finishes_after_stop_during_countdown() {
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::playing_from(0.0),
        LogCapture::default(),
        None,
    );

    session.step();
    assert_eq!(session.reactor().window_state(), WindowState::CountingDown);
    tokio::time::advance(Duration::from_millis(500)).await;
    session.request_stop();
    session.step();
    assert!(session.player().is_playing(), "stop hands playback back");

    timeout(Duration::from_secs(60), session.run(CancellationToken::new()))
        .await
        .expect("run returns once the media is over");

    // A was skipped; B still ran its full cycle.
    assert_eq!(session.capture().calls, vec![CaptureCall::Start, CaptureCall::Stop(1)]);
    assert!(session.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_best_effort_continues_after_failed_seek() {
    let player = FlakyPlayer { inner: VirtualPlayer::paused_at(0.0), fail_seek: true };
    let mut session =
        DubbingSession::new(EngineConfig::default(), two_segments(), player, LogCapture::default(), None);

    session.step_at(Millis(0));
    assert_eq!(session.reactor().window_state(), WindowState::CountingDown);

    session.step_at(Millis(3000));
    assert_eq!(session.reactor().window_state(), WindowState::Recording);
    assert_eq!(session.capture().calls, vec![CaptureCall::Start]);
    assert!(session.player().inner.is_playing());
    assert_eq!(session.reactor().telemetry.snapshot().failure_stats.command_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_does_not_stop_cycle() {
    let capture = LogCapture { fail_start: true, ..LogCapture::default() };
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::paused_at(0.0),
        capture,
        None,
    );

    session.step_at(Millis(0));
    session.step_at(Millis(3000));

    assert_eq!(session.reactor().window_state(), WindowState::Recording);
    assert_eq!(session.reactor().telemetry.snapshot().failure_stats.capture_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_mic_samples_land_in_segment_window() {
    let mic = ScriptedPitch(VecDeque::from(vec![
        Some(150.0),
        Some(150.0),
        Some(220.0),
        None,
        Some(5000.0),
    ]));
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::paused_at(0.5),
        LogCapture::default(),
        Some(Box::new(mic)),
    );

    // Countdown: readings are dropped. The sample at 3000 arrives in the
    // same step as the countdown expiry, before recording starts.
    session.step_at(Millis(0));
    session.step_at(Millis(3000));
    assert_eq!(session.reactor().window_state(), WindowState::Recording);

    session.step_at(Millis(3100));
    session.step_at(Millis(3200));
    session.step_at(Millis(3300));

    let window = session.reactor().window_for_segment(0).unwrap();
    assert_eq!(window.local.len(), 1);
    assert_eq!(window.local[0].hz, 220.0);

    let snap = session.reactor().telemetry.snapshot();
    assert_eq!(snap.pitch_stats.rejected_outside_recording, 2);
    assert_eq!(snap.pitch_stats.rejected_unvoiced, 1);
    assert_eq!(snap.pitch_stats.rejected_out_of_band, 1);
    assert_eq!(snap.failure_stats.microphone_unavailable, 0);
}

#[tokio::test(start_paused = true)]
async fn test_manual_stop_and_media_replacement() {
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::paused_at(0.0),
        LogCapture::default(),
        None,
    );

    session.step_at(Millis(0));
    session.step_at(Millis(3000));
    session.request_stop();
    session.step_at(Millis(3020));
    assert_eq!(session.capture().calls, vec![CaptureCall::Start, CaptureCall::Stop(0)]);

    session.load_media(MediaItem::from_spans(vec![(0.0, 1.0, "X"), (1.0, 2.0, "Y"), (2.0, 4.0, "Z")]));
    session.step_at(Millis(3040));
    assert_eq!(session.reactor().segments().len(), 3);
    // Scheduler forgot the old index, so the next poll re-enters segment 0.
    assert_eq!(session.reactor().active_index(), None);
    session.step_at(Millis(3200));
    assert_eq!(session.reactor().active_index(), Some(0));
    assert_eq!(session.reactor().window_state(), WindowState::CountingDown);
}

#[tokio::test(start_paused = true)]
async fn test_media_replacement_stops_live_recording() {
    let mut session = DubbingSession::new(
        EngineConfig::default(),
        two_segments(),
        VirtualPlayer::paused_at(0.0),
        LogCapture::default(),
        None,
    );

    session.step_at(Millis(0));
    session.step_at(Millis(3000));
    session.load_media(MediaItem::from_spans(vec![(0.0, 2.0, "new")]));
    session.step_at(Millis(3020));

    assert_eq!(session.capture().calls, vec![CaptureCall::Start, CaptureCall::Stop(0)]);
    assert_eq!(session.reactor().telemetry.snapshot().window_stats.media_replaced, 1);
}
