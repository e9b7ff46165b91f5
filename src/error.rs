//! Reffy error types

use std::path::PathBuf;
use thiserror::Error;

/// Reffy error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(String),

    /// Manifest exists on disk but cannot be parsed. Distinct from the
    /// missing-manifest case, which yields a fresh empty manifest: the store
    /// must never replace a corrupt manifest with an empty one.
    #[error("Manifest at {} is corrupt: {detail}", .path.display())]
    ManifestCorrupt { path: PathBuf, detail: String },

    /// Summarization error
    #[error("Summarize error: {0}")]
    Summarize(String),

    /// Watcher error
    #[error("Watcher error: {0}")]
    Watcher(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Reffy operations
pub type Result<T> = std::result::Result<T, Error>;
