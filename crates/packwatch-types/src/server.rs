//! Registry server records
//!
//! A `ServerRecord` is one entry served by the remote registry: a
//! `namespace/name` identity, a version string, a lifecycle status, and the
//! packages that can be materialized into orchestrator packs. Records are
//! immutable once fetched; they live for a single poll cycle.

use crate::transport::Transport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a registry record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Published and installable
    Active,

    /// Still listed but superseded; selected only when explicitly allowed
    Deprecated,

    /// Tombstoned upstream
    Deleted,

    /// A status this build does not know about yet
    #[serde(other)]
    Unknown,
}

impl Default for ServerStatus {
    fn default() -> Self {
        ServerStatus::Active
    }
}

impl ServerStatus {
    /// Whether this record is eligible for pack generation at all
    pub fn is_active(&self) -> bool {
        matches!(self, ServerStatus::Active)
    }
}

/// One installable package attached to a server record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package ecosystem the artifact lives in (e.g. `npm`, `pypi`, `oci`)
    pub registry_type: String,

    /// Ecosystem-specific package identifier
    pub identifier: String,

    /// Package version string
    pub version: String,

    /// Transport the packaged server speaks
    pub transport: Transport,
}

/// A registry entry describing a deployable server and its packages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Raw `namespace/name` identity as the registry serves it
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version string; semver-shaped but not guaranteed parseable
    pub version: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: ServerStatus,

    /// Installable packages; empty for remote-only servers
    #[serde(default)]
    pub packages: Vec<Package>,

    /// Last upstream modification, when the registry exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ServerRecord {
    /// Parse this record's `namespace/name` identity
    pub fn parsed_name(&self) -> Result<ServerName, InvalidServerName> {
        self.name.parse()
    }
}

/// A parsed `namespace/name` identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerName {
    /// Publisher namespace (e.g. `acme`)
    pub namespace: String,

    /// Server name within the namespace (e.g. `widget`)
    pub name: String,
}

impl ServerName {
    /// The canonical `namespace/name` form
    pub fn full(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ServerName {
    type Err = InvalidServerName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(ServerName {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(InvalidServerName(s.to_string())),
        }
    }
}

/// A server name that does not follow the `namespace/name` form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid server name {0:?}: expected namespace/name")]
pub struct InvalidServerName(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_name() {
        let name: ServerName = "acme/widget".parse().unwrap();
        assert_eq!(name.namespace, "acme");
        assert_eq!(name.name, "widget");
        assert_eq!(name.full(), "acme/widget");
    }

    #[test]
    fn test_parse_server_name_keeps_extra_slashes_in_name() {
        let name: ServerName = "io.github.acme/tools/widget".parse().unwrap();
        assert_eq!(name.namespace, "io.github.acme");
        assert_eq!(name.name, "tools/widget");
    }

    #[test]
    fn test_parse_server_name_rejects_malformed() {
        assert!("widget".parse::<ServerName>().is_err());
        assert!("/widget".parse::<ServerName>().is_err());
        assert!("acme/".parse::<ServerName>().is_err());
        assert!("".parse::<ServerName>().is_err());
    }

    #[test]
    fn test_status_deserializes_unknown_values() {
        let status: ServerStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, ServerStatus::Unknown);

        let status: ServerStatus = serde_json::from_str("\"deprecated\"").unwrap();
        assert_eq!(status, ServerStatus::Deprecated);
        assert!(!status.is_active());
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let record: ServerRecord = serde_json::from_str(
            r#"{ "name": "acme/widget", "version": "1.0.0" }"#,
        )
        .unwrap();
        assert_eq!(record.status, ServerStatus::Active);
        assert!(record.packages.is_empty());
        assert!(record.updated_at.is_none());
    }
}
