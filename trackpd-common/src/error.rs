//! Common error types for TrackPD

use thiserror::Error;

/// Common result type for TrackPD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TrackPD microservices
#[derive(Error, Debug)]
pub enum Error {
    /// Store operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document body or credential file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store credentials missing or malformed
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
