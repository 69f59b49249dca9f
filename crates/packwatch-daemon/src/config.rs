//! Configuration for packwatchd

use packwatch_registry::{BackoffPolicy, RegistryConfig};
use packwatch_watcher::{OutputKind, WatcherConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Registry client configuration
    #[serde(default)]
    pub registry: RegistrySection,

    /// Watch loop configuration
    #[serde(default)]
    pub watch: WatchSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Registry base URL
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retry attempt cap for 5xx/transport failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Linear backoff base in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl RegistrySection {
    /// Build the registry client configuration this section describes
    pub fn client_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(self.url.clone());
        config.request_timeout_secs = self.request_timeout_secs;
        config.retry = BackoffPolicy {
            max_attempts: self.max_attempts,
            base_delay_ms: self.retry_base_delay_ms,
        };
        config
    }
}

/// Watch loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSection {
    /// Poll interval in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Path of the persisted watch state
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Maximum concurrent generation tasks
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Root directory generated packs land in
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Exact `namespace/name` allowlist; empty matches all
    #[serde(default)]
    pub name_filter: Vec<String>,

    /// Package registry-type allowlist; empty matches all
    #[serde(default)]
    pub package_type_filter: Vec<String>,

    /// User-facing transport allowlist; empty matches all
    #[serde(default)]
    pub transport_type_filter: Vec<String>,

    /// Also generate packs for deprecated records
    #[serde(default)]
    pub allow_deprecated: bool,

    /// Regenerate regardless of recorded state
    #[serde(default)]
    pub force_overwrite: bool,

    /// Resolve and log, but write nothing
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            state_file: default_state_file(),
            max_concurrent: default_max_concurrent(),
            output_dir: default_output_dir(),
            name_filter: Vec::new(),
            package_type_filter: Vec::new(),
            transport_type_filter: Vec::new(),
            allow_deprecated: false,
            force_overwrite: false,
            dry_run: false,
        }
    }
}

impl WatchSection {
    /// Build the watcher configuration this section describes
    pub fn watcher_config(&self) -> WatcherConfig {
        let mut config = WatcherConfig::new(self.state_file.clone(), self.output_dir.clone());
        config.poll_interval = Duration::from_secs(self.interval_secs);
        config.max_concurrent = self.max_concurrent;
        config.name_filter = self.name_filter.clone();
        config.package_type_filter = self.package_type_filter.clone();
        config.transport_type_filter = self.transport_type_filter.clone();
        config.allow_deprecated = self.allow_deprecated;
        config.force_overwrite = self.force_overwrite;
        config.dry_run = self.dry_run;
        config.output = OutputKind::Directory;
        config
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_registry_url() -> String {
    "https://registry.packwatch.dev".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_interval() -> u64 {
    300
}

fn default_state_file() -> PathBuf {
    PathBuf::from("packwatch-state.json")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("packs")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file, and environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with PACKWATCH_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("PACKWATCH")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
