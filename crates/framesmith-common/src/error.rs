//! Error types for location-level and filesystem failures.
//!
//! Video-level failures (probe, template, transcode) live in `framesmith-av`;
//! this covers what happens around them: scanning a location and moving files
//! between its directories.

use std::path::PathBuf;

/// Common error type for framesmith.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input tree of a location could not be traversed.
    #[error("scan of {} failed: {message}", root.display())]
    Scan { root: PathBuf, message: String },

    /// A move or directory creation failed while relocating files.
    #[error("cannot {action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new Scan error.
    pub fn scan<S: Into<String>>(root: impl Into<PathBuf>, msg: S) -> Self {
        Self::Scan {
            root: root.into(),
            message: msg.into(),
        }
    }

    /// Create a new Filesystem error.
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
