//! Error types for the integration boundary

use thiserror::Error;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter errors. All of these are recoverable: callers log them and
/// schedule a retry rather than failing the compliance transaction.
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication against the external ledger failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// The ledger rejected the sync request
    #[error("Sync rejected: {0}")]
    Sync(String),

    /// Retry queue is at capacity
    #[error("Retry queue full: {current}/{max}")]
    QueueFull {
        /// Current queue depth
        current: usize,
        /// Configured capacity
        max: usize,
    },
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}
