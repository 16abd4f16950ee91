//! Rate limit and retry configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Token bucket parameters.
///
/// # Examples
///
/// ```
/// use chronicler_rate_limit::RateLimitConfig;
///
/// let config = RateLimitConfig::default();
/// assert_eq!(*config.permits_per_minute(), 2000);
/// assert_eq!(config.effective_burst(), 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RateLimitConfig {
    /// Permits refilled per minute
    #[serde(default = "default_permits_per_minute")]
    permits_per_minute: u32,

    /// Bucket capacity; defaults to one minute of permits
    #[serde(default)]
    burst: Option<u32>,

    /// Calls allowed in flight at once; unlimited when unset
    #[serde(default)]
    max_concurrent: Option<u32>,
}

fn default_permits_per_minute() -> u32 {
    2000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            permits_per_minute: default_permits_per_minute(),
            burst: None,
            max_concurrent: None,
        }
    }
}

impl RateLimitConfig {
    /// Bucket capacity actually used.
    pub fn effective_burst(&self) -> u32 {
        self.burst.unwrap_or(self.permits_per_minute)
    }
}

/// Retry and timeout parameters for generation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    max_retries: usize,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_initial_backoff_ms")]
    initial_backoff_ms: u64,

    /// Upper bound on any single delay (seconds)
    #[serde(default = "default_max_backoff_secs")]
    max_backoff_secs: u64,

    /// Randomize delays to avoid synchronized retries
    #[serde(default = "default_jitter")]
    jitter: bool,

    /// Wall-clock budget per attempt (seconds)
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_max_backoff_secs() -> u64 {
    60
}

fn default_jitter() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            jitter: default_jitter(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
