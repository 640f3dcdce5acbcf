use serde::{Deserialize, Serialize};

use super::window::StopReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerCommand {
    Seek,
    Play,
    Pause,
}

/// Commands the engine wants executed, in order, by the session driver.
/// The reactor never touches a collaborator itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SideEffect {
    Pause { segment: usize },
    Seek { segment: usize, to: f64 },
    Play { segment: usize },
    StartRecording { segment: usize },
    StopRecording { segment: usize, reason: StopReason },
}

impl SideEffect {
    pub fn segment(&self) -> usize {
        match self {
            SideEffect::Pause { segment }
            | SideEffect::Seek { segment, .. }
            | SideEffect::Play { segment }
            | SideEffect::StartRecording { segment }
            | SideEffect::StopRecording { segment, .. } => *segment,
        }
    }

    /// The player command this effect maps to, if it targets the player.
    pub fn player_command(&self) -> Option<PlayerCommand> {
        match self {
            SideEffect::Pause { .. } => Some(PlayerCommand::Pause),
            SideEffect::Seek { .. } => Some(PlayerCommand::Seek),
            SideEffect::Play { .. } => Some(PlayerCommand::Play),
            _ => None,
        }
    }
}
