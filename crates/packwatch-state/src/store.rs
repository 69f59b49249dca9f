//! Thread-safe state store with crash-safe persistence

use crate::error::{StateError, StateResult};
use crate::model::{state_key, ServerState, WatchState};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Thread-safe wrapper around [`WatchState`]
///
/// One reader/writer lock guards the whole aggregate; tasks dispatched within
/// a poll cycle share nothing else, so this lock is the store's entire
/// concurrency story.
#[derive(Debug, Default)]
pub struct StateStore {
    state: RwLock<WatchState>,
}

impl StateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from disk
    ///
    /// A missing file yields a fresh empty store; a file that exists but
    /// fails to parse is an error.
    pub async fn load(path: &Path) -> StateResult<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let state: WatchState =
            serde_json::from_str(&contents).map_err(|source| StateError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Persist the store to disk atomically
    ///
    /// Serializes under the read lock, writes a temp file in the same
    /// directory, then renames it over the target. A reader never observes a
    /// partial document and a crash mid-write leaves the committed file
    /// intact.
    pub async fn save(&self, path: &Path) -> StateResult<()> {
        let json = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state).map_err(StateError::Serialize)?
        };

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StateError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| StateError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(())
    }

    /// Whether the given tuple needs (re)generation
    ///
    /// True if the tuple has never been generated, or if `updated_at` is
    /// strictly after the stored `generated_at`. Regeneration is monotonic:
    /// evidence of being newer triggers it, "older" or "equal" never does.
    pub async fn needs_generation(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
        package_type: &str,
        transport_type: &str,
        updated_at: DateTime<Utc>,
    ) -> bool {
        let key = state_key(namespace, name, version, package_type, transport_type);
        let state = self.state.read().await;
        match state.servers.get(&key) {
            Some(existing) => updated_at > existing.generated_at,
            None => true,
        }
    }

    /// Record a successful generation (idempotent upsert by derived key)
    pub async fn set_server(&self, server: ServerState) {
        let mut state = self.state.write().await;
        state.servers.insert(server.key(), server);
    }

    /// Look up a stored entry by composite key
    pub async fn get(&self, key: &str) -> Option<ServerState> {
        let state = self.state.read().await;
        state.servers.get(key).cloned()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        state.servers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Record the start time of the poll cycle that just completed
    pub async fn update_last_poll(&self, at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        state.last_poll = Some(at);
    }

    /// Start time of the last completed poll cycle, if any
    pub async fn last_poll(&self) -> Option<DateTime<Utc>> {
        let state = self.state.read().await;
        state.last_poll
    }
}

/// Temp-file path next to the target, so the final rename stays on one
/// filesystem
fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}
