//! Generation filters
//!
//! Filters are immutable configuration, constructed once per watcher. Each
//! filter is a set of allowed values where the empty set matches everything.

use crate::transport::user_transport_name;
use std::collections::HashSet;

/// Exact-match filter over `namespace/name` identities
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    names: HashSet<String>,
}

impl NameFilter {
    /// Build from a list of `namespace/name` strings; empty matches all
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the given full name passes this filter
    pub fn matches(&self, full_name: &str) -> bool {
        self.names.is_empty() || self.names.contains(full_name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Case-insensitive filter over package registry types (e.g. `npm`, `pypi`)
#[derive(Debug, Clone, Default)]
pub struct PackageTypeFilter {
    types: HashSet<String>,
}

impl PackageTypeFilter {
    /// Build from a list of type names; empty matches all
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether the given registry type passes this filter
    pub fn matches(&self, registry_type: &str) -> bool {
        self.types.is_empty() || self.types.contains(&registry_type.to_ascii_lowercase())
    }
}

/// Case-insensitive filter over user-facing transport names
///
/// Registry-side names are mapped to user-facing names before comparison, so
/// a filter configured with `http` matches packages the registry lists as
/// `streamable-http`.
#[derive(Debug, Clone, Default)]
pub struct TransportTypeFilter {
    transports: HashSet<String>,
}

impl TransportTypeFilter {
    /// Build from a list of user-facing transport names; empty matches all
    pub fn new<I, S>(transports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            transports: transports
                .into_iter()
                .map(|t| user_transport_name(t.as_ref()).to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether the given registry-side transport name passes this filter
    pub fn matches(&self, registry_transport: &str) -> bool {
        self.transports.is_empty()
            || self
                .transports
                .contains(&user_transport_name(registry_transport).to_ascii_lowercase())
    }
}

/// The three filters a watcher applies, bundled
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    /// Exact `namespace/name` allowlist
    pub names: NameFilter,

    /// Package registry-type allowlist
    pub package_types: PackageTypeFilter,

    /// User-facing transport allowlist
    pub transports: TransportTypeFilter,
}

impl FilterSet {
    pub fn new(
        names: NameFilter,
        package_types: PackageTypeFilter,
        transports: TransportTypeFilter,
    ) -> Self {
        Self {
            names,
            package_types,
            transports,
        }
    }
}
