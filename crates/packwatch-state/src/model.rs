//! Persisted state model
//!
//! The on-disk document:
//!
//! ```json
//! {
//!   "last_poll": "2026-08-06T12:00:00Z",
//!   "servers": {
//!     "acme/widget@1.0.0:npm:stdio": {
//!       "namespace": "acme", "name": "widget", "version": "1.0.0",
//!       "package_type": "npm", "transport_type": "stdio",
//!       "updated_at": "...", "generated_at": "...", "checksum": ""
//!     }
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derive the composite key identifying one generated tuple
///
/// Separators are `/`, `@`, and `:`. The key is injective as long as no
/// component contains a separator, which holds for registry namespaces,
/// names, versions, and the fixed package/transport type vocabularies.
pub fn state_key(
    namespace: &str,
    name: &str,
    version: &str,
    package_type: &str,
    transport_type: &str,
) -> String {
    format!("{namespace}/{name}@{version}:{package_type}:{transport_type}")
}

/// One successfully generated tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerState {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub package_type: String,
    pub transport_type: String,

    /// Upstream modification time observed when the tuple was generated
    pub updated_at: DateTime<Utc>,

    /// When generation last succeeded for this tuple
    pub generated_at: DateTime<Utc>,

    /// Reserved for a future content-based staleness check
    #[serde(default)]
    pub checksum: String,
}

impl ServerState {
    /// The composite key this entry is stored under
    pub fn key(&self) -> String {
        state_key(
            &self.namespace,
            &self.name,
            &self.version,
            &self.package_type,
            &self.transport_type,
        )
    }
}

/// Top-level persisted aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchState {
    /// Start time of the last completed poll cycle
    pub last_poll: Option<DateTime<Utc>>,

    /// Generated tuples keyed by composite key
    #[serde(default)]
    pub servers: HashMap<String, ServerState>,
}
