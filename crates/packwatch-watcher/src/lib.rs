//! Packwatch Watcher - Poll-and-generate reconciliation loop
//!
//! The watcher drives the whole pipeline: on a timer it fetches changed
//! records from the registry, reduces them to generation tasks against the
//! durable state store, dispatches the tasks to a concurrency-bounded worker
//! pool calling the external pack generator, and persists the outcome —
//! every cycle, success or partial failure.
//!
//! Failure handling is bulkheaded: one task failing (benignly or
//! critically) never cancels or blocks its siblings, and a failed cycle
//! never stops the loop — the next tick still fires.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod filter;
pub mod generator;
pub mod watcher;

pub use config::{WatcherConfig, MIN_POLL_INTERVAL};
pub use error::{WatcherError, WatcherResult};
pub use filter::{plan_generation, GenerationTask};
pub use generator::{GenerateError, GenerateOptions, OutputKind, PackGenerator};
pub use watcher::{CycleSummary, Watcher};
