//! Text-generation client and provider drivers for Chronicler.
//!
//! [`GenerationClient`] wraps any [`GenerationDriver`] with the shared rate
//! limiter, exponential-backoff retries and a hard per-attempt timeout, and
//! records OpenTelemetry metrics for every call. Providers live behind
//! feature flags:
//!
//! - **Gemini** (Google) - `gemini` feature, enabled by default
//!
//! ```no_run
//! # #[cfg(feature = "gemini")]
//! # {
//! use chronicler_core::GenerateRequest;
//! use chronicler_models::{GeminiDriver, GenerationClient};
//! use chronicler_rate_limit::{RateLimitConfig, RateLimiter, RetryPolicy};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = GeminiDriver::from_env("gemini-2.0-flash")?;
//! let limiter = RateLimiter::new(&RateLimitConfig::default())?;
//! let client = GenerationClient::new(driver, limiter, RetryPolicy::default());
//!
//! let response = client
//!     .generate(&GenerateRequest::new("You are a novelist.", "Open a storm scene."))
//!     .await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! # }
//! ```
//!
//! [`GenerationDriver`]: chronicler_interface::GenerationDriver

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod metrics;

#[cfg(feature = "gemini")]
mod gemini;

pub use client::GenerationClient;
pub use metrics::{LlmMetrics, classify_error};

#[cfg(feature = "gemini")]
pub use gemini::GeminiDriver;
