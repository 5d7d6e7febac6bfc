//! Error types for bookmarkprep.
//!
//! Library crates use [`BookmarkPrepError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all bookmarkprep operations.
#[derive(Debug, thiserror::Error)]
pub enum BookmarkPrepError {
    /// The input artifact does not exist.
    #[error("input not found: {path:?}")]
    InputNotFound { path: PathBuf },

    /// The input artifact is not well-formed, or a record has a wrong-typed field.
    #[error("malformed input {path:?}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Filesystem I/O error (unreadable input, unwritable output, directory creation).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Data validation error (serialization failure, invalid shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookmarkPrepError>;

impl BookmarkPrepError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a malformed-input error for the artifact at `path`.
    pub fn malformed(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a read-side `std::io::Error`: a missing file becomes
    /// [`BookmarkPrepError::InputNotFound`], anything else stays an I/O error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::InputNotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
