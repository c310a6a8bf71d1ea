//! Error types for Timbre studio

use thiserror::Error;

/// Result type alias for Timbre operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Timbre studio
#[derive(Debug, Error)]
pub enum Error {
    /// No valid session for the caller
    #[error("authentication required")]
    Unauthenticated,

    /// Request input rejected before any side effect
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Caller has no credits left
    #[error("insufficient credits")]
    InsufficientCredits,

    /// TTS provider rejected the request or was unreachable.
    ///
    /// Guarantees no credit was spent and no record was created.
    #[error("provider error: {0}")]
    Provider(String),

    /// Storage operation failed
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Playback resource failed to load or failed mid-playback
    #[error("playback error: {0}")]
    Playback(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
