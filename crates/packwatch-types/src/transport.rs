//! Transport naming
//!
//! The registry and the user-facing configuration disagree on one transport
//! name: the registry lists `streamable-http` where users (and generated
//! packs) say `http`. Filters compare user-facing names, so every
//! registry-side name is mapped before comparison.

use serde::{Deserialize, Serialize};

/// Registry-side transport name for the HTTP transport
pub const TRANSPORT_STREAMABLE_HTTP: &str = "streamable-http";

/// User-facing transport name for the HTTP transport
pub const TRANSPORT_HTTP: &str = "http";

/// Transport declaration attached to a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    /// Registry-side transport name (e.g. `stdio`, `sse`, `streamable-http`)
    #[serde(rename = "type")]
    pub kind: String,
}

impl Transport {
    /// The user-facing name of this transport
    pub fn user_name(&self) -> &str {
        user_transport_name(&self.kind)
    }
}

/// Map a registry-side transport name to its user-facing name
pub fn user_transport_name(registry_name: &str) -> &str {
    if registry_name.eq_ignore_ascii_case(TRANSPORT_STREAMABLE_HTTP) {
        TRANSPORT_HTTP
    } else {
        registry_name
    }
}

/// Map a user-facing transport name back to the registry-side name
pub fn registry_transport_name(user_name: &str) -> &str {
    if user_name.eq_ignore_ascii_case(TRANSPORT_HTTP) {
        TRANSPORT_STREAMABLE_HTTP
    } else {
        user_name
    }
}
