use tokio::time::Instant;

use super::collaborators::PlaybackController;
use crate::kernel::effect::PlayerCommand;

/// Clock-driven stand-in for a video player.
///
/// Position advances with `tokio::time`, so a paused test runtime moves it
/// deterministically.
#[derive(Debug)]
pub struct VirtualPlayer {
    position: f64,
    anchor: Option<Instant>,
    history: Vec<(PlayerCommand, f64)>,
}

impl VirtualPlayer {
    pub fn paused_at(position: f64) -> Self {
        Self {
            position: position.max(0.0),
            anchor: None,
            history: Vec::new(),
        }
    }

    pub fn playing_from(position: f64) -> Self {
        let mut player = Self::paused_at(position);
        player.anchor = Some(Instant::now());
        player
    }

    pub fn is_playing(&self) -> bool {
        self.anchor.is_some()
    }

    /// Every command received, with the position right after it.
    pub fn history(&self) -> &[(PlayerCommand, f64)] {
        &self.history
    }
}

impl PlaybackController for VirtualPlayer {
    fn seek(&mut self, secs: f64) -> anyhow::Result<()> {
        if !secs.is_finite() {
            anyhow::bail!("seek target {} is not finite", secs);
        }
        self.position = secs.max(0.0);
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
        self.history.push((PlayerCommand::Seek, self.position));
        Ok(())
    }

    fn play(&mut self) -> anyhow::Result<()> {
        if self.anchor.is_none() {
            self.anchor = Some(Instant::now());
        }
        self.history.push((PlayerCommand::Play, self.position));
        Ok(())
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.position = self.current_time();
        self.anchor = None;
        self.history.push((PlayerCommand::Pause, self.position));
        Ok(())
    }

    fn current_time(&self) -> f64 {
        match self.anchor {
            Some(anchor) => self.position + anchor.elapsed().as_secs_f64(),
            None => self.position,
        }
    }
}
