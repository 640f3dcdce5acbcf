pub mod cancel;
pub mod effect;
pub mod event;
pub mod pitch;
pub mod reactor;
pub mod recording;
pub mod scheduler;
pub mod segment;
pub mod telemetry;
pub mod time;
pub mod window;
