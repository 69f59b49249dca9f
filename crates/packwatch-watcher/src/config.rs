//! Watcher configuration

use crate::error::{WatcherError, WatcherResult};
use crate::generator::OutputKind;
use packwatch_types::{FilterSet, NameFilter, PackageTypeFilter, TransportTypeFilter};
use std::path::PathBuf;
use std::time::Duration;

/// Minimum allowed poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Watcher configuration
///
/// Validated once at construction; the watcher fails fast on any violation
/// before touching the network or the state file.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Time between poll cycles; at least [`MIN_POLL_INTERVAL`]
    pub poll_interval: Duration,

    /// Path of the persisted watch state
    pub state_file: PathBuf,

    /// Maximum concurrently running generation tasks; at least 1
    pub max_concurrent: usize,

    /// Exact `namespace/name` allowlist; empty matches all
    pub name_filter: Vec<String>,

    /// Package registry-type allowlist; empty matches all
    pub package_type_filter: Vec<String>,

    /// User-facing transport allowlist; empty matches all
    pub transport_type_filter: Vec<String>,

    /// Also generate packs for deprecated records
    pub allow_deprecated: bool,

    /// Regenerate regardless of recorded state
    pub force_overwrite: bool,

    /// Passed through to the generator: resolve but do not write
    pub dry_run: bool,

    /// Root directory generated packs land in
    pub output_dir: PathBuf,

    /// Output shape requested from the generator
    pub output: OutputKind,
}

impl WatcherConfig {
    /// Configuration with the given state file and output directory,
    /// defaults elsewhere
    pub fn new(state_file: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            state_file: state_file.into(),
            max_concurrent: 4,
            name_filter: Vec::new(),
            package_type_filter: Vec::new(),
            transport_type_filter: Vec::new(),
            allow_deprecated: false,
            force_overwrite: false,
            dry_run: false,
            output_dir: output_dir.into(),
            output: OutputKind::Directory,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> WatcherResult<()> {
        if self.poll_interval < MIN_POLL_INTERVAL {
            return Err(WatcherError::Config(format!(
                "poll interval {}s is below the minimum of {}s",
                self.poll_interval.as_secs(),
                MIN_POLL_INTERVAL.as_secs()
            )));
        }
        if self.max_concurrent < 1 {
            return Err(WatcherError::Config(
                "max concurrent tasks must be at least 1".to_string(),
            ));
        }
        if self.state_file.as_os_str().is_empty() {
            return Err(WatcherError::Config(
                "state file path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the immutable filter set this configuration describes
    pub fn filters(&self) -> FilterSet {
        FilterSet::new(
            NameFilter::new(self.name_filter.iter().cloned()),
            PackageTypeFilter::new(&self.package_type_filter),
            TransportTypeFilter::new(&self.transport_type_filter),
        )
    }
}
