//! Centralized error types for exportmail.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the exportmail library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `finalize` was called before any attachment was stored.
    #[error("I/O error: no attachment was stored in this batch")]
    EmptyBatch,

    /// The file name cannot be turned into an attachment name.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The composed message does not fit the fixed capacity.
    #[error("Composed message is {len} bytes, capacity is {capacity}")]
    BufferOverflow { len: usize, capacity: usize },

    /// The mail client could not be launched, or exited with a failure.
    #[error("Cannot launch mail client: {0}")]
    LaunchFailure(String),

    /// A string that should be a `mailto:` URI is malformed.
    #[error("Invalid mailto URI: {0}")]
    InvalidMailto(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for the I/O class of errors, including an empty batch.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::EmptyBatch)
    }
}
