//! Packwatch Registry - Resilient HTTP client for the package registry
//!
//! Thin client over the registry's `/v0/servers` API with the reliability
//! behavior the reconciler depends on:
//!
//! - cursor-driven pagination with a server-side page cap
//! - linear retry/backoff on 5xx and transport failures, never on 4xx
//! - cancellation-aware backoff sleeps
//! - `latest_active` resolution governed by semantic-version ordering

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod retry;

pub use client::{ListQuery, PageMetadata, RegistryClient, RegistryConfig, ServerPage};
pub use error::{RegistryError, RegistryResult};
pub use retry::BackoffPolicy;
