//! Rate limiter implementation using governor and Tokio Semaphore.
//!
//! GCRA (Generic Cell Rate Algorithm) is a token bucket with continuous,
//! time-based refill: each permit becomes available `60s / permits_per_minute`
//! after the previous one, and up to `burst` permits can be taken at once.

use crate::{RateLimitConfig, RetryPolicy};
use chronicler_error::{
    ChroniclerResult, ConfigError, GenerationError, GenerationErrorKind, RetryableError,
};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared limiter gating every generation call.
///
/// Cloning is cheap; clones share the same bucket.
///
/// # Examples
///
/// ```
/// use chronicler_rate_limit::{RateLimitConfig, RateLimiter};
///
/// let config = RateLimitConfig::default().with_burst(Some(1));
/// let limiter = RateLimiter::new(&config).unwrap();
///
/// let guard = limiter.try_acquire();
/// assert!(guard.is_some());
/// assert!(limiter.try_acquire().is_none());
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DirectRateLimiter>,
    concurrency: Option<Arc<Semaphore>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("concurrency_limited", &self.concurrency.is_some())
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter from configuration.
    ///
    /// Zero permits per minute, a zero burst or zero concurrency is a
    /// configuration error.
    pub fn new(config: &RateLimitConfig) -> ChroniclerResult<Self> {
        let per_minute = NonZeroU32::new(*config.permits_per_minute())
            .ok_or_else(|| ConfigError::new("permits_per_minute must be greater than zero"))?;
        let burst = NonZeroU32::new(config.effective_burst())
            .ok_or_else(|| ConfigError::new("burst must be greater than zero"))?;
        let quota = Quota::per_minute(per_minute).allow_burst(burst);

        let concurrency = match config.max_concurrent() {
            Some(0) => {
                return Err(ConfigError::new("max_concurrent must be greater than zero").into());
            }
            Some(n) => Some(Arc::new(Semaphore::new(*n as usize))),
            None => None,
        };

        debug!(
            permits_per_minute = config.permits_per_minute(),
            burst = burst.get(),
            "Created rate limiter"
        );
        Ok(Self {
            bucket: Arc::new(GovernorRateLimiter::direct(quota)),
            concurrency,
        })
    }

    /// Create a limiter from an explicit quota, without a concurrency cap.
    pub fn from_quota(quota: Quota) -> Self {
        Self {
            bucket: Arc::new(GovernorRateLimiter::direct(quota)),
            concurrency: None,
        }
    }

    /// Wait cooperatively until a permit is available.
    ///
    /// Returns a guard that releases the concurrency slot (if any) when dropped.
    pub async fn acquire(&self) -> RateLimiterGuard {
        self.bucket.until_ready().await;

        // Concurrency slot last, so a slot is never held while waiting on the bucket.
        let permit = match &self.concurrency {
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        };
        RateLimiterGuard { _permit: permit }
    }

    /// Take a permit without waiting.
    ///
    /// Returns `None` if the bucket is empty or every concurrency slot is taken.
    pub fn try_acquire(&self) -> Option<RateLimiterGuard> {
        self.bucket.check().ok()?;
        let permit = match &self.concurrency {
            Some(semaphore) => Some(semaphore.clone().try_acquire_owned().ok()?),
            None => None,
        };
        Some(RateLimiterGuard { _permit: permit })
    }

    /// Execute an operation with rate limiting, timeout and automatic retry.
    ///
    /// For each attempt:
    /// 1. Waits for a permit
    /// 2. Runs the operation under the policy's wall-clock timeout
    /// 3. Retries transient failures (throttling, unavailability, network,
    ///    timeout) after the next backoff delay
    /// 4. Returns permanent failures immediately
    ///
    /// A timeout counts as one attempt. When every retry fails transiently the
    /// error is `GenerationErrorKind::RetryExhausted` carrying the last failure.
    pub async fn execute<F, Fut, R>(
        &self,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> ChroniclerResult<R>
    where
        F: FnMut() -> Fut + Send + Sync,
        Fut: Future<Output = ChroniclerResult<R>>,
    {
        let attempts = AtomicUsize::new(0);
        let timeout = policy.timeout();

        let result = Retry::spawn(policy.delays(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let call = operation();
            let limiter = self;
            async move {
                let _guard = limiter.acquire().await;
                let outcome = match tokio::time::timeout(timeout, call).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(GenerationError::new(GenerationErrorKind::Timeout(
                        timeout.as_secs(),
                    ))
                    .into()),
                };

                match outcome {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_retryable() => {
                        warn!(attempt, error = %e, "Transient error, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Permanent error, failing immediately");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_retryable() => {
                let attempts = attempts.load(Ordering::SeqCst);
                let last = e
                    .generation_kind()
                    .cloned()
                    .unwrap_or(GenerationErrorKind::EmptyResponse);
                warn!(attempts, last = %last, "Retries exhausted");
                Err(GenerationError::new(GenerationErrorKind::RetryExhausted {
                    attempts,
                    last: Box::new(last),
                })
                .into())
            }
            Err(e) => Err(e),
        }
    }
}

/// RAII guard for a rate limiter permit.
///
/// Releases the concurrency slot, if the limiter has one, when dropped.
pub struct RateLimiterGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}
