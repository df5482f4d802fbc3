//! Common error types for Nest

use thiserror::Error;

/// Common result type for Nest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Nest services
#[derive(Error, Debug)]
pub enum Error {
    /// Weights source unreachable or not parseable as a weights table
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
