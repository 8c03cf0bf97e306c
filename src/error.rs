//! Defines the launcher's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all launcher errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Invalid or inconsistent launcher settings.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to accessing environment variables.
    #[error("Environment Error: {0}")]
    Env(#[from] std::env::VarError),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The main process could not be started (or replaced into).
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Error originating from the keepalive HTTP client (`reqwest`).
    #[error("HTTP Error: {0}")]
    Http(Arc<reqwest::Error>),

    /// The keepalive endpoint answered, but not healthily.
    #[error("Health Check Failed: {0}")]
    Health(String),

    /// Error during JSON (de)serialization (`serde_json`).
    #[error("JSON Error: {0}")]
    Json(Arc<serde_json::Error>),
}

impl AppError {
    /// Maps the error onto the process exit code the launcher should terminate with.
    ///
    /// Launch failures follow the shell convention (127 not found, 126 otherwise),
    /// configuration errors use clap's usage code 2 and everything else is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Launch { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                127
            },
            AppError::Launch { .. } => 126,
            AppError::Config(_) | AppError::Env(_) => 2,
            _ => 1,
        }
    }
}

/// A specialized `Result` type using the launcher's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// Arc is used for non-Clone error types.

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(Arc::new(err))
    }
}
