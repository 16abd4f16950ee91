//! Layered application configuration.

use chronicler_core::ProjectConfig;
use chronicler_error::{ChroniclerError, ChroniclerResult, ConfigError};
use chronicler_rate_limit::{RateLimitConfig, RetryConfig};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../chronicler.toml");

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Settings shared by every project on this machine.
///
/// # Examples
///
/// ```
/// use chronicler::ChroniclerConfig;
///
/// let config = ChroniclerConfig::from_toml_str("model = \"gemini-2.5-pro\"").unwrap();
/// assert_eq!(config.model, "gemini-2.5-pro");
/// assert_eq!(*config.retry.max_retries(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChroniclerConfig {
    /// Default model for every agent role
    pub model: String,
    /// Project storage root; the platform data directory when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Logging
    #[serde(default)]
    pub log: LogConfig,
    /// Shared token bucket
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Retry and timeout discipline for generation calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Defaults for newly created projects
    #[serde(default)]
    pub project: ProjectConfig,
}

impl ChroniclerConfig {
    /// Load configuration with precedence: current directory > home directory > bundled defaults.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. Bundled defaults (`chronicler.toml` shipped with the crate)
    /// 2. `~/.config/chronicler/chronicler.toml`
    /// 3. `./chronicler.toml`
    ///
    /// Missing user files are skipped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a file cannot be parsed or a value
    /// is out of range.
    #[instrument]
    pub fn load() -> ChroniclerResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("chronicler").join("chronicler.toml");
            builder = builder.add_source(File::from(user).required(false));
        }
        builder = builder.add_source(File::with_name("chronicler").required(false));

        Self::finish(builder.build())
    }

    /// Load bundled defaults overlaid with one file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file is missing or invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ChroniclerResult<Self> {
        debug!("Loading configuration from file");
        let built = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build();
        Self::finish(built)
    }

    /// Bundled defaults overlaid with TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the text is invalid.
    pub fn from_toml_str(overrides: &str) -> ChroniclerResult<Self> {
        let built = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build();
        Self::finish(built)
    }

    fn finish(built: Result<Config, config::ConfigError>) -> ChroniclerResult<Self> {
        let config: Self = built
            .map_err(|e| {
                ChroniclerError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ChroniclerError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could work with.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first bad value.
    pub fn validate(&self) -> ChroniclerResult<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::new("model must not be empty").into());
        }
        if *self.rate_limit.permits_per_minute() == 0 {
            return Err(ConfigError::new("rate_limit.permits_per_minute must be at least 1").into());
        }
        if *self.retry.timeout_secs() == 0 {
            return Err(ConfigError::new("retry.timeout_secs must be at least 1").into());
        }
        let project = &self.project;
        if *project.target_word_count() == 0 {
            return Err(ConfigError::new("project.target_word_count must be at least 1").into());
        }
        if *project.max_retries() == 0 {
            return Err(ConfigError::new("project.max_retries must be at least 1").into());
        }
        if *project.min_score() > 100 {
            return Err(ConfigError::new(format!(
                "project.min_score must be at most 100, got {}",
                project.min_score()
            ))
            .into());
        }
        if !(0.0..=2.0).contains(project.temperature()) {
            return Err(ConfigError::new(format!(
                "project.temperature must lie in 0.0-2.0, got {}",
                project.temperature()
            ))
            .into());
        }
        Ok(())
    }

    /// Storage root: `override_dir`, then `data_dir`, then the platform data
    /// directory, then `./chronicler-data`.
    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .or_else(|| dirs::data_dir().map(|d| d.join("chronicler")))
            .unwrap_or_else(|| PathBuf::from("chronicler-data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let config = ChroniclerConfig::from_toml_str("").expect("bundled config is valid");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(*config.rate_limit.permits_per_minute(), 2000);
        assert_eq!(*config.retry.timeout_secs(), 300);
        assert_eq!(config.project.genre(), "general");
        assert_eq!(*config.project.target_word_count(), 2800);
        assert!(!config.log.json);
    }

    #[test]
    fn test_overrides_are_layered() {
        let config = ChroniclerConfig::from_toml_str(
            "[project]\ngenre = \"fantasy\"\nmin_score = 80\n\n[log]\njson = true",
        )
        .expect("valid overrides");
        assert_eq!(config.project.genre(), "fantasy");
        assert_eq!(*config.project.min_score(), 80);
        assert_eq!(*config.project.max_retries(), 3);
        assert!(config.log.json);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(ChroniclerConfig::from_toml_str("[project]\nmin_score = 120").is_err());
        assert!(ChroniclerConfig::from_toml_str("[project]\nmax_retries = 0").is_err());
        assert!(ChroniclerConfig::from_toml_str("model = \" \"").is_err());
    }

    #[test]
    fn test_data_dir_override_wins() {
        let config = ChroniclerConfig::from_toml_str("data_dir = \"/srv/stories\"").expect("valid");
        assert_eq!(config.resolve_data_dir(None), PathBuf::from("/srv/stories"));
        assert_eq!(
            config.resolve_data_dir(Some(Path::new("/tmp/other"))),
            PathBuf::from("/tmp/other")
        );
    }
}
