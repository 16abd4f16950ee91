//! Exponential backoff schedule.

use crate::RetryConfig;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};

/// Backoff schedule and per-attempt timeout derived from [`RetryConfig`].
///
/// # Examples
///
/// ```
/// use chronicler_rate_limit::{RetryConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(
///     RetryConfig::default()
///         .with_initial_backoff_ms(100)
///         .with_jitter(false),
/// );
/// assert_eq!(
///     policy.delays(),
///     vec![
///         Duration::from_millis(100),
///         Duration::from_millis(200),
///         Duration::from_millis(400),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// The configuration this policy was built from.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delays before each retry, doubling from the initial backoff and
    /// capped at the maximum delay. One entry per allowed retry.
    pub fn delays(&self) -> Vec<Duration> {
        // ExponentialBackoff yields factor * base^n; base 2 with factor
        // initial/2 gives initial, 2*initial, 4*initial...
        let factor = (self.config.initial_backoff_ms() / 2).max(1);
        let schedule = ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(Duration::from_secs(*self.config.max_backoff_secs()))
            .take(*self.config.max_retries());
        if *self.config.jitter() {
            schedule.map(jitter).collect()
        } else {
            schedule.collect()
        }
    }

    /// Wall-clock budget for one attempt.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(*self.config.timeout_secs())
    }

    /// Retries allowed after the first attempt.
    pub fn max_retries(&self) -> usize {
        *self.config.max_retries()
    }
}
