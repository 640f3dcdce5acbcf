use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dubsync::audio::{open_microphone, TakeBuffer, WavTakeRecorder};
use dubsync::media::loader::load_media;
use dubsync::session::{AudioCapture, CapturedAudio, DubbingSession, NullCapture, PitchSource, VirtualPlayer};
use dubsync::EngineConfig;

/// Headless dubbing practice session over a virtual player.
#[derive(Parser, Debug)]
#[command(name = "dubsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Media item JSON: a file path or an http(s) URL
    media: String,

    /// Engine configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for recorded takes (WAV). Takes are discarded when unset.
    #[arg(short, long)]
    takes: Option<PathBuf>,

    /// Skip microphone capture
    #[arg(long)]
    no_mic: bool,

    /// Override the countdown length in milliseconds
    #[arg(long)]
    countdown_ms: Option<u64>,
}

/// Lets the binary pick the capture at runtime.
enum Capture {
    Wav(WavTakeRecorder),
    Null(NullCapture),
}

impl AudioCapture for Capture {
    fn on_recording_start(&mut self) -> anyhow::Result<()> {
        match self {
            Capture::Wav(c) => c.on_recording_start(),
            Capture::Null(c) => c.on_recording_start(),
        }
    }

    fn on_recording_stop(&mut self, segment: usize) -> anyhow::Result<CapturedAudio> {
        match self {
            Capture::Wav(c) => c.on_recording_stop(segment),
            Capture::Null(c) => c.on_recording_stop(segment),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dubsync=info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ms) = cli.countdown_ms {
        config.countdown_ms = ms;
    }
    config.validate()?;

    let media = load_media(&cli.media).await?;
    tracing::info!("dubsync booting: {} segments", media.segments.len());

    let take = TakeBuffer::new();
    let mut sample_rate = 16_000;

    // The stream must outlive the session.
    let mut _stream = None;
    let mic: Option<Box<dyn PitchSource>> = if cli.no_mic {
        None
    } else {
        match open_microphone(&config, take.clone()) {
            Ok((stream, source)) => {
                sample_rate = stream.sample_rate;
                _stream = Some(stream);
                Some(Box::new(source))
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    };

    let session_id = uuid::Uuid::new_v4();
    let capture = match &cli.takes {
        Some(dir) => Capture::Wav(WavTakeRecorder::new(dir, sample_rate, session_id, take)),
        None => Capture::Null(NullCapture::default()),
    };

    let mut session = DubbingSession::new(config, media, VirtualPlayer::playing_from(0.0), capture, mic)
        .with_session_id(session_id);

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    session.run(shutdown).await;

    for take in session.takes() {
        match &take.path {
            Some(path) => println!("segment {}: {} ({}ms)", take.segment, path.display(), take.duration_ms),
            None => println!("segment {}: no audio", take.segment),
        }
    }

    let snap = session.reactor().telemetry.snapshot();
    println!(
        "{} boundaries, {} recordings ({} elapsed, {} preempted, {} manual), {} command failures",
        snap.boundary_stats.crossings,
        snap.window_stats.recordings_started,
        snap.window_stats.elapsed,
        snap.window_stats.preempted,
        snap.window_stats.manual,
        snap.failure_stats.command_failures,
    );

    Ok(())
}
