//! Unified error handling for the CLI.

use crate::config::ConfigError;
use std::path::PathBuf;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] termsync_engine::Error),

    #[error("Failed to read reference file {}: {source}", .path.display())]
    ReadReference {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid reference file {}: {source}", .path.display())]
    ParseReference {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to render report: {0}")]
    Render(serde_json::Error),
}

/// Result type alias for the CLI.
pub type Result<T> = std::result::Result<T, AppError>;
