//! Daemon error types

use packwatch_registry::RegistryError;
use packwatch_watcher::WatcherError;
use thiserror::Error;

/// Daemon errors
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Watcher(#[from] WatcherError),
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
