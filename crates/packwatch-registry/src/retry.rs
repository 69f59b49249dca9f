//! Retry/backoff policy

use serde::Deserialize;
use std::time::Duration;

/// Linear backoff policy for retryable registry failures
///
/// The delay before attempt `n + 1` is `n * base_delay_ms`, so a policy with
/// a 500ms base sleeps 500ms after the first failure and 1s after the second.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct BackoffPolicy {
    /// Maximum number of attempts, including the first (minimum 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl BackoffPolicy {
    /// Delay to sleep after the given 1-based failed attempt
    pub fn delay_after(&self, attempt: usize) -> Duration {
        Duration::from_millis(attempt as u64 * self.base_delay_ms)
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}
