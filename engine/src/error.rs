//! Error types for the TermSync engine.

use thiserror::Error;

/// All possible errors from the engine and its remote collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Snapshot errors
    #[error("failed to fetch remote records: {0}")]
    Fetch(String),

    // Session errors
    #[error("failed to open session: {0}")]
    SessionOpen(String),

    #[error("failed to submit request: {0}")]
    Submit(String),

    #[error("failed to close session: {0}")]
    SessionClose(String),

    // Protocol errors
    #[error("remote returned error {status_code}: {message}")]
    Remote { status_code: i32, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
