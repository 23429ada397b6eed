use std::path::PathBuf;

use thiserror::Error;

/// State document persistence errors.
///
/// Any of these is fatal to the operation that triggered the write: the
/// caller must not continue with partially persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No persisted state for workflow: {0}")]
    NotFound(String),

    #[error("State document at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl StoreError {
    /// Attach a path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
