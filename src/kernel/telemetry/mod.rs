//! Engine telemetry.
//!
//! Telemetry is a write-only side channel. Nothing in the reactor, the
//! scheduler or the state machine reads it back to make a decision. It
//! carries indices, durations and enums only, never caption text or audio.

pub mod event;
pub mod metrics;
pub mod recorder;
