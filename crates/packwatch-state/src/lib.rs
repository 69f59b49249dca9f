//! Packwatch State - Durable generation-state store
//!
//! Tracks which (namespace, name, version, package type, transport type)
//! tuples have already been generated, so poll cycles stay idempotent across
//! process restarts. The in-memory map is guarded by a single reader/writer
//! lock and persisted as a JSON document via temp-file-then-rename, so a
//! crash mid-save never corrupts the committed file.

#![deny(unsafe_code)]

pub mod error;
pub mod model;
pub mod store;

pub use error::{StateError, StateResult};
pub use model::{state_key, ServerState, WatchState};
pub use store::StateStore;
