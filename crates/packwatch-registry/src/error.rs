//! Registry client error types

use thiserror::Error;

/// Registry client errors
///
/// The variants encode the retry taxonomy: `Client` (4xx) is never retried,
/// `Server` (5xx) and `Transport` are retried and show up wrapped in
/// `Exhausted` once the attempt cap is hit.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested server does not exist (HTTP 404 on a single fetch)
    #[error("server not found: {id}")]
    NotFound { id: String },

    /// The registry rejected the request; not retried
    #[error("registry rejected request ({status}): {body}")]
    Client { status: u16, body: String },

    /// The registry failed server-side; retried until the attempt cap
    #[error("registry returned {status}: {body}")]
    Server { status: u16, body: String },

    /// Connection, DNS, timeout, or body-decoding failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Retryable failures persisted through every allowed attempt
    #[error("registry request failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: usize,
        #[source]
        source: Box<RegistryError>,
    },

    /// No active record with a parseable semantic version exists
    #[error("no active version of {name} with a parseable semantic version")]
    NoActiveVersion { name: String },

    /// The governing cancellation token fired mid-request or mid-backoff
    #[error("registry request cancelled")]
    Cancelled,
}

impl RegistryError {
    /// Whether this error would be retried by the client's backoff loop
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Server { .. } | RegistryError::Transport(_))
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
