//! Error types for key derivation and the key database.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading release metadata or key databases.
#[derive(Debug, Error)]
pub enum Error {
    /// Release directory names start with a version number.
    #[error("'{0}' is not a release directory (expected a name like 3.8)")]
    InvalidRelease(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type for key operations.
pub type Result<T> = std::result::Result<T, Error>;
