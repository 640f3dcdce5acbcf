use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::kernel::pitch::{DEFAULT_LOCAL_CAPACITY, DEFAULT_MAX_HZ, DEFAULT_MIN_HZ};
use crate::kernel::recording::COUNTDOWN_MS;
use crate::kernel::time::{MIC_INTERVAL_MS, POLL_INTERVAL_MS, TICK_MS};

/// What to do when the player rejects a seek, play or pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log and keep going; a missed seek does not abort the attempt.
    BestEffort,
    /// Abort the current segment's attempt.
    Strict,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::BestEffort
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub countdown_ms: u64,
    pub tick_ms: u64,
    pub poll_interval_ms: u64,
    pub mic_interval_ms: u64,
    pub min_hz: f32,
    pub max_hz: f32,
    pub local_capacity: usize,
    /// RMS below which a microphone frame counts as silence.
    pub silence_rms: f32,
    pub failure_policy: FailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            countdown_ms: COUNTDOWN_MS,
            tick_ms: TICK_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            mic_interval_ms: MIC_INTERVAL_MS,
            min_hz: DEFAULT_MIN_HZ,
            max_hz: DEFAULT_MAX_HZ,
            local_capacity: DEFAULT_LOCAL_CAPACITY,
            silence_rms: 0.01,
            failure_policy: FailurePolicy::BestEffort,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.tick_ms == 0 || self.poll_interval_ms == 0 || self.mic_interval_ms == 0 {
            return Err(EngineError::Config("intervals must be non-zero".to_string()));
        }
        if !(self.min_hz > 0.0 && self.min_hz < self.max_hz) {
            return Err(EngineError::Config(format!(
                "pitch band {}..{} Hz is empty",
                self.min_hz, self.max_hz
            )));
        }
        if self.local_capacity == 0 {
            return Err(EngineError::Config("local_capacity must be at least 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.silence_rms) {
            return Err(EngineError::Config("silence_rms must be in [0, 1)".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "countdown_ms": 2000, "failure_policy": "strict" }"#).unwrap();
        assert_eq!(config.countdown_ms, 2000);
        assert_eq!(config.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.local_capacity, 50);
    }

    #[test]
    fn test_inverted_band_rejected() {
        let err = EngineConfig::from_json(r#"{ "min_hz": 900.0, "max_hz": 100.0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
