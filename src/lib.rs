pub mod audio;
pub mod config;
pub mod error;
pub mod kernel;
pub mod media;
pub mod session;

pub use config::{EngineConfig, FailurePolicy};
pub use error::{EngineError, EngineResult};
pub use kernel::reactor::Reactor;
pub use media::MediaItem;
pub use session::DubbingSession;
