use super::effect::PlayerCommand;
use super::pitch::PitchSample;
use crate::media::MediaItem;

/// Inputs to one reactor step.
#[derive(Debug, Clone)]
pub enum Event {
    /// New media item. Replaces captions and reference pitch wholesale.
    LoadMedia(MediaItem),
    /// A sample of the player's clock, in seconds.
    PlaybackTime(f64),
    /// A microphone pitch reading stamped on the media clock.
    Pitch(PitchSample),
    /// User asked to stop the current attempt.
    ManualStop,
    /// A player command for `segment` failed under the strict policy.
    CommandFailed { segment: usize, command: PlayerCommand },
    /// Session is going away; cancel everything.
    Teardown,
}
