/// Error types for the feed engine
///
/// The taxonomy mirrors the engine's failure policy: transport failures are
/// retryable and may downgrade to the fixture dataset, validation failures are
/// rejected locally and never transmitted, and a moderation rejection blocks
/// publication while leaving the draft intact.
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Backend or moderation service unreachable, timed out, or returned
    /// a non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Input rejected locally (e.g. empty comment text). Never sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The moderation gate returned a definitive UNSAFE verdict. The draft
    /// text is preserved by the caller for editing.
    #[error("Moderation rejected: {0}")]
    ModerationRejected(String),

    /// Referenced post or comment is not in the canonical collection.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invariant violation or unexpected internal state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Only transport failures are worth retrying. An UNSAFE verdict or a
    /// local validation failure is definitive.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transport(_))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Transport(format!("malformed response: {}", err))
    }
}
