//! Filter pipeline
//!
//! Reduces a batch of fetched records to the generation tasks this cycle
//! actually needs, consulting the configured filters and the state store.
//! One malformed record never aborts the batch, and the resulting task
//! order is the deterministic record-then-package discovery order.

use chrono::Utc;
use packwatch_state::StateStore;
use packwatch_types::{FilterSet, Package, ServerName, ServerRecord, ServerStatus};

/// One unit of generation work, derived per cycle and consumed once
#[derive(Debug, Clone)]
pub struct GenerationTask {
    /// The record the task was derived from
    pub server: ServerRecord,

    /// The selected package
    pub package: Package,

    /// Parsed `namespace/name` identity
    pub name: ServerName,
}

impl GenerationTask {
    /// The user-facing transport name this task generates for
    pub fn transport(&self) -> &str {
        self.package.transport.user_name()
    }
}

/// Reduce fetched records to generation tasks
///
/// `force` includes every surviving (record, package) pair unconditionally;
/// otherwise the state store's monotonic `needs_generation` policy decides,
/// fed the record's upstream `updated_at` or the observation time when the
/// registry does not expose one.
pub async fn plan_generation(
    records: &[ServerRecord],
    filters: &FilterSet,
    store: &StateStore,
    allow_deprecated: bool,
    force: bool,
) -> Vec<GenerationTask> {
    let mut tasks = Vec::new();

    for record in records {
        let name = match record.parsed_name() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping record with malformed name");
                continue;
            }
        };

        if !filters.names.matches(&name.full()) {
            continue;
        }

        match record.status {
            ServerStatus::Active => {}
            ServerStatus::Deprecated if allow_deprecated => {}
            status => {
                tracing::debug!(server = %name, status = ?status, "Skipping record by status");
                continue;
            }
        }

        if record.packages.is_empty() {
            tracing::debug!(server = %name, "Skipping remote-only record with no packages");
            continue;
        }

        let observed_at = record.updated_at.unwrap_or_else(Utc::now);

        for package in &record.packages {
            if !filters.package_types.matches(&package.registry_type) {
                continue;
            }
            if !filters.transports.matches(&package.transport.kind) {
                continue;
            }

            let needed = force
                || store
                    .needs_generation(
                        &name.namespace,
                        &name.name,
                        &record.version,
                        &package.registry_type,
                        package.transport.user_name(),
                        observed_at,
                    )
                    .await;

            if needed {
                tasks.push(GenerationTask {
                    server: record.clone(),
                    package: package.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use packwatch_state::ServerState;
    use packwatch_types::{NameFilter, PackageTypeFilter, Transport, TransportTypeFilter};

    fn record(name: &str, version: &str, status: ServerStatus) -> ServerRecord {
        ServerRecord {
            name: name.to_string(),
            description: None,
            version: version.to_string(),
            status,
            packages: vec![package("npm", "stdio")],
            updated_at: None,
        }
    }

    fn package(registry_type: &str, transport: &str) -> Package {
        Package {
            registry_type: registry_type.to_string(),
            identifier: "pkg".to_string(),
            version: "1.0.0".to_string(),
            transport: Transport {
                kind: transport.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_active_matching_record_yields_one_task_per_package() {
        let store = StateStore::new();
        let records = vec![record("acme/widget", "1.0.0", ServerStatus::Active)];

        let tasks =
            plan_generation(&records, &FilterSet::default(), &store, false, false).await;

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name.full(), "acme/widget");
        assert_eq!(tasks[0].transport(), "stdio");
    }

    #[tokio::test]
    async fn test_malformed_name_skips_record_not_batch() {
        let store = StateStore::new();
        let records = vec![
            record("not-a-full-name", "1.0.0", ServerStatus::Active),
            record("acme/widget", "1.0.0", ServerStatus::Active),
        ];

        let tasks =
            plan_generation(&records, &FilterSet::default(), &store, false, false).await;

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name.full(), "acme/widget");
    }

    #[tokio::test]
    async fn test_name_filter_excludes_other_servers() {
        let store = StateStore::new();
        let filters = FilterSet::new(
            NameFilter::new(["acme/widget"]),
            PackageTypeFilter::default(),
            TransportTypeFilter::default(),
        );
        let records = vec![
            record("acme/widget", "1.0.0", ServerStatus::Active),
            record("acme/gadget", "1.0.0", ServerStatus::Active),
        ];

        let tasks = plan_generation(&records, &filters, &store, false, false).await;

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name.full(), "acme/widget");
    }

    #[tokio::test]
    async fn test_status_gate_honors_allow_deprecated() {
        let store = StateStore::new();
        let records = vec![
            record("acme/old", "1.0.0", ServerStatus::Deprecated),
            record("acme/gone", "1.0.0", ServerStatus::Deleted),
        ];

        let tasks =
            plan_generation(&records, &FilterSet::default(), &store, false, false).await;
        assert!(tasks.is_empty());

        // deprecated is allowed in, deleted never is
        let tasks =
            plan_generation(&records, &FilterSet::default(), &store, true, false).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name.full(), "acme/old");
    }

    #[tokio::test]
    async fn test_records_without_packages_are_skipped() {
        let store = StateStore::new();
        let mut remote_only = record("acme/widget", "1.0.0", ServerStatus::Active);
        remote_only.packages.clear();

        let tasks =
            plan_generation(&[remote_only], &FilterSet::default(), &store, false, false).await;

        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_package_and_transport_filters_apply_per_package() {
        let store = StateStore::new();
        let mut multi = record("acme/widget", "1.0.0", ServerStatus::Active);
        multi.packages = vec![
            package("npm", "stdio"),
            package("pypi", "stdio"),
            package("npm", "streamable-http"),
        ];

        let filters = FilterSet::new(
            NameFilter::default(),
            PackageTypeFilter::new(["npm"]),
            TransportTypeFilter::new(["http"]),
        );
        let tasks = plan_generation(&[multi], &filters, &store, false, false).await;

        // only the npm/streamable-http package passes both filters
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].package.registry_type, "npm");
        assert_eq!(tasks[0].transport(), "http");
    }

    #[tokio::test]
    async fn test_generated_tuple_with_old_update_is_not_replanned() {
        let store = StateStore::new();
        let generated_at = Utc::now();
        store
            .set_server(ServerState {
                namespace: "acme".to_string(),
                name: "widget".to_string(),
                version: "1.0.0".to_string(),
                package_type: "npm".to_string(),
                transport_type: "stdio".to_string(),
                updated_at: generated_at,
                generated_at,
                checksum: String::new(),
            })
            .await;

        let mut stale = record("acme/widget", "1.0.0", ServerStatus::Active);
        stale.updated_at = Some(generated_at - Duration::hours(1));

        let tasks =
            plan_generation(&[stale.clone()], &FilterSet::default(), &store, false, false).await;
        assert!(tasks.is_empty());

        // a strictly newer upstream update is replanned
        stale.updated_at = Some(generated_at + Duration::hours(1));
        let tasks =
            plan_generation(&[stale], &FilterSet::default(), &store, false, false).await;
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_force_bypasses_state_store() {
        let store = StateStore::new();
        let generated_at = Utc::now();
        store
            .set_server(ServerState {
                namespace: "acme".to_string(),
                name: "widget".to_string(),
                version: "1.0.0".to_string(),
                package_type: "npm".to_string(),
                transport_type: "stdio".to_string(),
                updated_at: generated_at,
                generated_at,
                checksum: String::new(),
            })
            .await;

        let mut seen = record("acme/widget", "1.0.0", ServerStatus::Active);
        seen.updated_at = Some(generated_at - Duration::hours(1));

        let tasks =
            plan_generation(&[seen], &FilterSet::default(), &store, false, true).await;
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_task_order_is_deterministic_discovery_order() {
        let store = StateStore::new();
        let mut first = record("acme/widget", "1.0.0", ServerStatus::Active);
        first.packages = vec![package("npm", "stdio"), package("pypi", "stdio")];
        let second = record("acme/gadget", "1.0.0", ServerStatus::Active);

        let tasks = plan_generation(
            &[first, second],
            &FilterSet::default(),
            &store,
            false,
            false,
        )
        .await;

        let order: Vec<_> = tasks
            .iter()
            .map(|t| format!("{}:{}", t.name.full(), t.package.registry_type))
            .collect();
        assert_eq!(
            order,
            vec!["acme/widget:npm", "acme/widget:pypi", "acme/gadget:npm"]
        );
    }
}
