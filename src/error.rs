use thiserror::Error;

/// Library-level errors. Collaborator failures (player, capture, microphone
/// reads) are `anyhow` values and never surface through this type.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid segment {index}: {reason}")]
    InvalidSegment { index: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("microphone unavailable: {0}")]
    Microphone(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
