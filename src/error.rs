//! Centralized error types for mailview.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced at the loader boundary.
///
/// Classification and extension lookup are total and never fail; a lookup
/// miss is `None`, not an error. The controller converts any `LoadError`
/// into a cleared display state rather than propagating it.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The entry does not name a message the loader can find.
    #[error("message not found: {0}")]
    NotFound(String),

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The fetched bytes could not be parsed as a MIME message.
    #[error("MIME parse error: {0}")]
    Parse(String),

    /// The entry contains path components the loader refuses to follow.
    #[error("invalid message entry: {0}")]
    InvalidEntry(String),

    /// The load was cancelled before completion.
    #[error("load cancelled")]
    Cancelled,
}

/// Convenience alias for `Result<T, LoadError>`.
pub type Result<T> = std::result::Result<T, LoadError>;

impl LoadError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
