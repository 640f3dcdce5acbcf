use serde::{Deserialize, Serialize};

/// Wall-clock instant on the engine's own monotonic millisecond axis.
/// Media positions are plain `f64` seconds; this type is only for timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Millis(pub u64);

/// Driver cadence. Timers resolve no finer than this.
pub const TICK_MS: u64 = 20;

/// Playback clock sampling interval.
pub const POLL_INTERVAL_MS: u64 = 200;

/// Microphone pitch sampling interval.
pub const MIC_INTERVAL_MS: u64 = 100;

impl Millis {
    pub fn zero() -> Self {
        Millis(0)
    }

    pub fn after(&self, duration_ms: u64) -> Self {
        Millis(self.0.saturating_add(duration_ms))
    }

    pub fn since(&self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Converts a media span in seconds into whole milliseconds, rounding to nearest.
pub fn secs_to_ms(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0).round() as u64
}
