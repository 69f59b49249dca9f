//! Packwatch Daemon - Continuous registry-to-pack reconciliation
//!
//! `packwatchd` watches a remote package registry and regenerates
//! orchestrator pack definitions as records change upstream:
//! - timed poll loop with one unscheduled poll at startup
//! - name/package-type/transport filtering against durable watch state
//! - concurrency-bounded generation with benign/critical failure split
//! - graceful shutdown on SIGINT/SIGTERM

use clap::Parser;
use packwatch_registry::RegistryClient;
use packwatch_watcher::Watcher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod generator;

use config::DaemonConfig;
use error::{DaemonError, DaemonResult};
use generator::PackWriter;

/// Packwatch Daemon CLI
#[derive(Parser)]
#[command(name = "packwatchd")]
#[command(about = "Packwatch daemon - continuous registry-to-pack reconciler", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PACKWATCH_CONFIG")]
    config: Option<String>,

    /// Registry base URL
    #[arg(long, env = "PACKWATCH_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Watch state file path
    #[arg(long, env = "PACKWATCH_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Output directory for generated packs
    #[arg(long, env = "PACKWATCH_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Poll interval in seconds
    #[arg(long, env = "PACKWATCH_INTERVAL")]
    interval: Option<u64>,

    /// Maximum concurrent generation tasks
    #[arg(long, env = "PACKWATCH_MAX_CONCURRENT")]
    max_concurrent: Option<usize>,

    /// Only watch these servers (repeatable)
    #[arg(long = "name", value_name = "NAMESPACE/NAME")]
    name_filter: Vec<String>,

    /// Only generate for these package types (repeatable)
    #[arg(long = "package-type", value_name = "TYPE")]
    package_type_filter: Vec<String>,

    /// Only generate for these transports (repeatable)
    #[arg(long = "transport", value_name = "TRANSPORT")]
    transport_type_filter: Vec<String>,

    /// Also generate packs for deprecated records
    #[arg(long)]
    allow_deprecated: bool,

    /// Regenerate packs regardless of recorded state
    #[arg(long)]
    force: bool,

    /// Resolve and log, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, env = "PACKWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "PACKWATCH_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(url) = cli.registry_url {
        config.registry.url = url;
    }
    if let Some(state_file) = cli.state_file {
        config.watch.state_file = state_file;
    }
    if let Some(output_dir) = cli.output_dir {
        config.watch.output_dir = output_dir;
    }
    if let Some(interval) = cli.interval {
        config.watch.interval_secs = interval;
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.watch.max_concurrent = max_concurrent;
    }
    if !cli.name_filter.is_empty() {
        config.watch.name_filter = cli.name_filter;
    }
    if !cli.package_type_filter.is_empty() {
        config.watch.package_type_filter = cli.package_type_filter;
    }
    if !cli.transport_type_filter.is_empty() {
        config.watch.transport_type_filter = cli.transport_type_filter;
    }
    if cli.allow_deprecated {
        config.watch.allow_deprecated = true;
    }
    if cli.force {
        config.watch.force_overwrite = true;
    }
    if cli.dry_run {
        config.watch.dry_run = true;
    }

    println!(
        "packwatchd {}\n  registry: {}\n  state:    {}\n  output:   {}\n  interval: {}s",
        env!("CARGO_PKG_VERSION"),
        config.registry.url,
        config.watch.state_file.display(),
        config.watch.output_dir.display(),
        config.watch.interval_secs,
    );

    // Build the pipeline
    let registry = RegistryClient::new(&config.registry.client_config())?;
    let generator = Arc::new(PackWriter::new());
    let watcher = Watcher::new(config.watch.watcher_config(), registry, generator).await?;

    // Translate SIGINT/SIGTERM into cancellation of the watcher's token
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping watcher");
        signal_token.cancel();
    });

    watcher.run(shutdown).await?;

    tracing::info!("packwatchd exited cleanly");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
