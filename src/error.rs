// src/error.rs
// Error taxonomy for header parsing, tailing, and the watch lifecycle

use std::path::PathBuf;
use thiserror::Error;

/// A data line whose field count does not match the schema.
///
/// Recoverable: the row is skipped and the watch session keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed row: expected {expected} fields, got {actual}")]
pub struct MalformedRowError {
    pub expected: usize,
    pub actual: usize,
    pub raw_line: String,
}

/// Main error type for logwatch
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("format error: {0}")]
    Format(String),

    #[error(transparent)]
    MalformedRow(#[from] MalformedRowError),

    #[error("transient I/O error: {0}")]
    IoTransient(String),

    #[error("file is gone: {}", .0.display())]
    FileGone(PathBuf),

    #[error("already watching {}", .0.display())]
    AlreadyWatching(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("visibility store error: {0}")]
    Store(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background task panicked or was cancelled unexpectedly
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Result using WatchError
pub type Result<T> = std::result::Result<T, WatchError>;

impl WatchError {
    /// Errors that end a watch session and need the user to pick a file again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WatchError::FileGone(_) | WatchError::Format(_) | WatchError::Internal(_)
        )
    }
}

impl From<tokio::task::JoinError> for WatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        WatchError::Internal(format!("background task failed: {}", err))
    }
}
