use thiserror::Error;

/// Failures inside the player runtime. None of these are fatal to the page:
/// callers log them and fall back to a degraded state.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("network request failed: {0}")]
    Network(String),
    #[error("invalid bootstrap config: {0}")]
    Config(String),
    #[error("required element not found: {0}")]
    MissingElement(&'static str),
}

pub type PlayerResult<T> = Result<T, PlayerError>;
