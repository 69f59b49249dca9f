//! State store error types

use std::path::PathBuf;
use thiserror::Error;

/// State persistence errors
///
/// A missing state file is not an error — the store starts empty. A file
/// that exists but does not parse is, since silently discarding committed
/// state would regenerate everything.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
