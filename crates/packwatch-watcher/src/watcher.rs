//! The watcher/reconciler control loop

use crate::config::WatcherConfig;
use crate::error::{WatcherError, WatcherResult};
use crate::filter::{plan_generation, GenerationTask};
use crate::generator::{GenerateOptions, PackGenerator};
use chrono::Utc;
use packwatch_registry::{ListQuery, RegistryClient, RegistryError};
use packwatch_state::{ServerState, StateStore};
use packwatch_types::FilterSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome counts of one completed poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Records fetched from the registry
    pub fetched: usize,

    /// Generation tasks the filter pipeline produced
    pub tasks: usize,

    /// Tasks that generated successfully
    pub succeeded: usize,

    /// Tasks that failed with a benign already-exists conflict
    pub benign: usize,

    /// Tasks skipped because shutdown was observed before they started
    pub skipped: usize,
}

/// Per-task result, private to the dispatch loop
enum TaskOutcome {
    Generated,
    Benign,
    Critical,
    Skipped,
}

/// Continuous registry-synchronization reconciler
///
/// Owns the state store, polls the registry on a timer, and dispatches
/// generation work to a bounded worker pool. One cancellation token governs
/// the whole lifetime; cancellation is cooperative — in-flight generator
/// calls run to completion, queued ones are skipped.
pub struct Watcher {
    config: WatcherConfig,
    registry: RegistryClient,
    store: Arc<StateStore>,
    generator: Arc<dyn PackGenerator>,
    filters: FilterSet,
    options: GenerateOptions,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("store", &self.store)
            .field("generator", &"<dyn PackGenerator>")
            .field("filters", &self.filters)
            .field("options", &self.options)
            .finish()
    }
}

impl Watcher {
    /// Create a watcher: validate configuration, then load persisted state
    pub async fn new(
        config: WatcherConfig,
        registry: RegistryClient,
        generator: Arc<dyn PackGenerator>,
    ) -> WatcherResult<Self> {
        config.validate()?;
        let store = Arc::new(StateStore::load(&config.state_file).await?);
        let filters = config.filters();
        let options = GenerateOptions {
            output_dir: config.output_dir.clone(),
            output: config.output,
            dry_run: config.dry_run,
            force: config.force_overwrite,
        };

        Ok(Self {
            config,
            registry,
            store,
            generator,
            filters,
            options,
        })
    }

    /// The watcher's state store
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Run the poll loop until the token is cancelled
    ///
    /// One unscheduled poll fires immediately, then the ticker takes over.
    /// Per-cycle errors are logged and never terminate the loop. Returns
    /// `Ok(())` once shutdown completes gracefully; the token is the only
    /// way out.
    pub async fn run(&self, shutdown: CancellationToken) -> WatcherResult<()> {
        tracing::info!(
            interval_secs = self.config.poll_interval.as_secs(),
            max_concurrent = self.config.max_concurrent,
            state_file = %self.config.state_file.display(),
            "Watcher started"
        );

        self.report_cycle(self.poll_once(&shutdown).await);

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.report_cycle(self.poll_once(&shutdown).await);
                }
            }
        }

        tracing::info!("Watcher stopped");
        Ok(())
    }

    fn report_cycle(&self, result: WatcherResult<CycleSummary>) {
        match result {
            Ok(summary) => tracing::info!(
                fetched = summary.fetched,
                tasks = summary.tasks,
                succeeded = summary.succeeded,
                benign = summary.benign,
                skipped = summary.skipped,
                "Poll cycle complete"
            ),
            Err(WatcherError::Registry(RegistryError::Cancelled)) => {
                tracing::debug!("Poll cycle interrupted by shutdown");
            }
            Err(e) => tracing::error!(error = %e, "Poll cycle failed"),
        }
    }

    /// Execute one poll cycle: fetch, filter, dispatch, persist
    ///
    /// A fetch error aborts the cycle without advancing `last_poll`. Once
    /// dispatch has begun, `last_poll` and the store are always advanced and
    /// persisted — even when tasks failed — and a critical aggregate error
    /// is returned only after that persistence step.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> WatcherResult<CycleSummary> {
        let cycle_start = Utc::now();

        let query = ListQuery {
            updated_since: self.store.last_poll().await,
            ..Default::default()
        };
        let records = self.registry.list_all_servers(cancel, &query).await?;

        let tasks = plan_generation(
            &records,
            &self.filters,
            &self.store,
            self.config.allow_deprecated,
            self.config.force_overwrite,
        )
        .await;
        tracing::debug!(
            fetched = records.len(),
            tasks = tasks.len(),
            "Planned poll cycle"
        );

        if tasks.is_empty() {
            self.store.update_last_poll(cycle_start).await;
            self.store.save(&self.config.state_file).await?;
            return Ok(CycleSummary {
                fetched: records.len(),
                ..CycleSummary::default()
            });
        }

        let total = tasks.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut pool = JoinSet::new();
        for task in tasks {
            pool.spawn(run_task(
                task,
                semaphore.clone(),
                self.generator.clone(),
                self.store.clone(),
                cancel.clone(),
                self.options.clone(),
            ));
        }

        let mut succeeded = 0;
        let mut benign = 0;
        let mut critical = 0;
        let mut skipped = 0;
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(TaskOutcome::Generated) => succeeded += 1,
                Ok(TaskOutcome::Benign) => benign += 1,
                Ok(TaskOutcome::Critical) => critical += 1,
                Ok(TaskOutcome::Skipped) => skipped += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Generation task panicked");
                    critical += 1;
                }
            }
        }

        // Persist before reporting failures; the next cycle's updated_since
        // narrowing depends on last_poll advancing every completed cycle.
        self.store.update_last_poll(cycle_start).await;
        let saved = self.store.save(&self.config.state_file).await;

        if critical > 0 {
            if let Err(e) = &saved {
                tracing::error!(error = %e, "Failed to persist state after cycle");
            }
            return Err(WatcherError::Cycle {
                succeeded,
                benign,
                critical,
                total,
            });
        }
        saved?;

        Ok(CycleSummary {
            fetched: records.len(),
            tasks: total,
            succeeded,
            benign,
            skipped,
        })
    }
}

/// Run one generation task behind the concurrency semaphore
///
/// Every task settles to an outcome; nothing a single task does can cancel
/// or block its siblings.
async fn run_task(
    task: GenerationTask,
    semaphore: Arc<Semaphore>,
    generator: Arc<dyn PackGenerator>,
    store: Arc<StateStore>,
    cancel: CancellationToken,
    options: GenerateOptions,
) -> TaskOutcome {
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return TaskOutcome::Skipped,
    };

    if cancel.is_cancelled() {
        tracing::debug!(server = %task.name, "Skipping task, shutdown in progress");
        return TaskOutcome::Skipped;
    }

    let transport = task.transport().to_string();
    match generator
        .generate(&task.server, &task.package, &transport, &options)
        .await
    {
        Ok(()) => {
            let now = Utc::now();
            store
                .set_server(ServerState {
                    namespace: task.name.namespace.clone(),
                    name: task.name.name.clone(),
                    version: task.server.version.clone(),
                    package_type: task.package.registry_type.clone(),
                    transport_type: transport.clone(),
                    updated_at: now,
                    generated_at: now,
                    checksum: String::new(),
                })
                .await;
            tracing::info!(
                server = %task.name,
                version = %task.server.version,
                package_type = %task.package.registry_type,
                transport = %transport,
                "Generated pack"
            );
            TaskOutcome::Generated
        }
        Err(e) if e.is_benign() => {
            tracing::warn!(server = %task.name, error = %e, "Pack already exists, skipping");
            TaskOutcome::Benign
        }
        Err(e) => {
            tracing::error!(server = %task.name, error = %e, "Pack generation failed");
            TaskOutcome::Critical
        }
    }
}
