//! Error types for depscope operations.
//!
//! Two tiers, in the spirit of "best effort" analysis:
//!
//! - [`Error`]: failures that stop an analysis (missing or malformed
//!   manifest, bad configuration, cancellation).
//! - [`FileError`]: per-file problems collected during graph construction.
//!   A file that cannot be read or parsed contributes no edges, but the
//!   remaining files are still processed.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::parser::ParseError;

/// Result type for depscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The manifest file does not exist.
    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// The manifest exists but could not be parsed.
    #[error("malformed manifest {path}: {source}")]
    MalformedManifest {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested export format is not supported.
    #[error("unsupported export format: '{0}' (expected json, dot, mermaid or csv)")]
    UnsupportedFormat(String),

    /// An include/exclude glob could not be compiled.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Invalid configuration values.
    #[error("configuration error: {0}")]
    Config(String),

    /// Parser infrastructure failed to initialize.
    #[error("parser error: {0}")]
    Parser(String),

    /// The analysis was cancelled by the caller.
    #[error("analysis cancelled")]
    Cancelled,

    /// The analysis exceeded its deadline.
    #[error("analysis timed out")]
    TimedOut,
}

impl Error {
    /// Maps a manifest parse failure onto the not-found / malformed split.
    pub fn from_manifest(path: impl Into<PathBuf>, err: ParseError) -> Self {
        let path = path.into();
        match err {
            ParseError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Error::ManifestNotFound(path)
            }
            ParseError::IoError(io) => Error::Io(io),
            other => Error::MalformedManifest {
                path,
                source: other,
            },
        }
    }
}

/// Error encountered while processing a single source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    /// Path of the file that failed.
    pub path: PathBuf,
    /// Category of the failure.
    pub kind: FileErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, kind: FileErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.path.display(), self.message, self.kind)
    }
}

impl std::error::Error for FileError {}

/// Categorization of per-file failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileErrorKind {
    /// Could not read the file from disk.
    ReadFailed,
    /// File content is not valid UTF-8.
    Encoding,
    /// The parser rejected the file.
    ParseFailed,
}

impl std::fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::Encoding => write!(f, "encoding error"),
            Self::ParseFailed => write!(f, "parse failed"),
        }
    }
}
