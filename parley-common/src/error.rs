//! Common error types for Parley

use thiserror::Error;

/// Common result type for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error taxonomy across Parley services
///
/// `NotFound`, `Conflict`, `Forbidden`, and `Expired` are surfaced to callers
/// distinctly; `Expired` is kept separate from `Conflict` so callers can offer
/// a "get a new token" flow instead of retrying a full venue.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Capacity exhausted or duplicate booking; caller must pick another target
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Level mismatch or non-participant access; non-retryable
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Token or session past its expiry
    #[error("Expired: {0}")]
    Expired(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
