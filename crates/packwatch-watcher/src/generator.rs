//! Pack generator contract
//!
//! The generator that turns a resolved (server, package, transport) tuple
//! into deployable pack artifacts is an external collaborator; the watcher
//! only depends on this seam. Implementations must be safe to invoke
//! concurrently for distinct (server, package) pairs.

use async_trait::async_trait;
use packwatch_types::{Package, ServerRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Requested shape of the generated output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// A pack directory tree
    Directory,

    /// A single packed archive
    Archive,
}

impl Default for OutputKind {
    fn default() -> Self {
        OutputKind::Directory
    }
}

/// Options passed to every generation call
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Root directory generated packs land in
    pub output_dir: PathBuf,

    /// Output shape
    pub output: OutputKind,

    /// Resolve and log, but write nothing
    pub dry_run: bool,

    /// Overwrite an existing pack instead of reporting a conflict
    pub force: bool,
}

/// Pack generation errors
///
/// `AlreadyExists` is the benign conflict class: the pack is already on
/// disk from a generation the state store has not seen. The watcher counts
/// it as a failed task but not as a critical one. Classification is by
/// variant, never by error text.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("pack already exists at {path}")]
    AlreadyExists { path: PathBuf },

    #[error("unsupported generation request: {0}")]
    Unsupported(String),

    #[error("pack I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenerateError {
    /// Whether this failure is a benign no-op conflict
    pub fn is_benign(&self) -> bool {
        matches!(self, GenerateError::AlreadyExists { .. })
    }
}

/// External generator turning resolved tuples into pack artifacts
///
/// `transport` is the user-facing transport name (already mapped from the
/// registry-side name).
#[async_trait]
pub trait PackGenerator: Send + Sync {
    async fn generate(
        &self,
        server: &ServerRecord,
        package: &Package,
        transport: &str,
        options: &GenerateOptions,
    ) -> Result<(), GenerateError>;
}
