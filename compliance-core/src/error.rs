//! Error types for the core compliance calculations

use thiserror::Error;

/// Result type for core compliance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core compliance errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No regulatory-value record covers the requested period. Fatal:
    /// propagates uncaught, no partial result is produced.
    #[error("No regulatory values configured for {scope} in period {period}")]
    ConfigurationMissing {
        /// Scope key that failed to resolve (NAICS code or product override)
        scope: String,
        /// Compliance period requested
        period: i32,
    },

    /// Product has no published emission intensity
    #[error("No emission intensity registered for product {0}")]
    MissingEmissionIntensity(String),

    /// No charge rate published for the period
    #[error("No charge rate configured for period {0}")]
    MissingChargeRate(i32),

    /// Report snapshot not available
    #[error("Report {0} not found")]
    MissingReport(uuid::Uuid),

    /// Business-rule violation surfaced to the user; never swallowed
    #[error("{0}")]
    User(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
