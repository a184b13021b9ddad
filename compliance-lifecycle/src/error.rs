//! Error types for the version lifecycle

use thiserror::Error;

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle errors
#[derive(Error, Debug)]
pub enum Error {
    /// Core calculation error
    #[error("Calculation error: {0}")]
    Core(#[from] compliance_core::Error),

    /// Re-running a creation for an already-finalized version; programmer
    /// error, caught defensively before any mutation
    #[error("Idempotency violation: {0}")]
    Idempotency(String),

    /// A transaction would break a structural invariant; nothing committed
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}
