//! Watcher error types

use packwatch_registry::RegistryError;
use packwatch_state::StateError;
use thiserror::Error;

/// Watcher errors
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Configuration rejected at construction, before any I/O
    #[error("invalid watcher configuration: {0}")]
    Config(String),

    /// Registry fetch failed; aborts the current cycle only
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// State load or persistence failed
    #[error(transparent)]
    State(#[from] StateError),

    /// Aggregate cycle outcome when at least one task failed critically
    ///
    /// Returned only after the cycle's state has been advanced and
    /// persisted; the counts describe the whole cycle.
    #[error(
        "{critical} of {total} generation tasks failed critically \
         ({succeeded} succeeded, {benign} benign conflicts)"
    )]
    Cycle {
        succeeded: usize,
        benign: usize,
        critical: usize,
        total: usize,
    },
}

/// Result type for watcher operations
pub type WatcherResult<T> = Result<T, WatcherError>;
