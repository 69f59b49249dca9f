//! Packwatch Types - Registry record model and filter types
//!
//! Packwatch watches a remote package registry and regenerates orchestrator
//! pack definitions as records change upstream. This crate holds the shared
//! vocabulary of that pipeline:
//!
//! - **ServerRecord**: one registry entry and its installable packages
//! - **ServerName**: the parsed `namespace/name` identity
//! - **Transport mapping**: registry-side transport names vs user-facing names
//! - **Filters**: immutable name/package-type/transport selection sets

#![deny(unsafe_code)]

pub mod filters;
pub mod server;
pub mod transport;

pub use filters::{FilterSet, NameFilter, PackageTypeFilter, TransportTypeFilter};
pub use server::{InvalidServerName, Package, ServerName, ServerRecord, ServerStatus};
pub use transport::{registry_transport_name, user_transport_name, Transport};
