//! Tracing subscriber setup for the binary.

use chronicler_error::{ChroniclerResult, ConfigError};
use std::env;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// How log output is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. "info", "chronicler_narrative=debug")
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Configuration with the given default filter.
    pub fn new(log_level: impl Into<String>) -> Self {
        Self {
            log_level: log_level.into(),
            json_logs: false,
        }
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// The filter in effect: `RUST_LOG` when set, otherwise `log_level`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when neither is a valid filter.
    pub fn env_filter(&self) -> ChroniclerResult<EnvFilter> {
        match env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives),
            _ => EnvFilter::try_new(&self.log_level),
        }
        .map_err(|e| ConfigError::new(format!("Invalid log filter: {}", e)).into())
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install the global tracing subscriber.
///
/// Log lines go to stderr so command output on stdout stays clean.
///
/// # Errors
///
/// Returns a configuration error when the filter is invalid or a subscriber
/// is already installed.
pub fn init_observability(config: &ObservabilityConfig) -> ChroniclerResult<()> {
    let env_filter = config.env_filter()?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_configuration_error() {
        if env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        assert!(ObservabilityConfig::new("info,chronicler=debug").env_filter().is_ok());
        assert!(ObservabilityConfig::new("chronicler=loudest").env_filter().is_err());
    }
}
