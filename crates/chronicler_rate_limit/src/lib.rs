//! Rate limiting and retry policy for generation calls.
//!
//! Every call to the text-generation provider passes through one shared
//! [`RateLimiter`]: a GCRA token bucket (via `governor`) with continuous
//! refill. Transient failures are retried with exponential backoff
//! (via `tokio-retry2`) under a [`RetryPolicy`], and every attempt carries a
//! hard wall-clock timeout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod retry;

pub use config::{RateLimitConfig, RetryConfig};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use retry::RetryPolicy;
