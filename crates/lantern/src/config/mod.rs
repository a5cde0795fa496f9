//! Configuration management for Lantern.
//!
//! Configuration is loaded from a TOML file with sensible defaults; every
//! section and field may be omitted. Validation happens at load time (and in
//! [`Engine::new`](crate::Engine::new)) so that a malformed setup surfaces
//! before any submission attempt runs.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Lantern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retry and backoff settings
    pub retry: RetryConfig,

    /// Submission orchestration settings
    pub submit: SubmitConfig,

    /// Status reporting settings
    pub status: StatusConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.lantern.lantern/config.toml
    /// - Linux: ~/.config/lantern/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\lantern\config\config.toml
    ///
    /// Falls back to ~/.lantern/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "lantern", "lantern")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".lantern").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.submit.proof_timeout_ms, 60_000);
        assert_eq!(config.status.tick_interval_ms, 100);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[retry]"));
        assert!(toml.contains("[submit]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_load_from_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nmax_retries = 7\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.retry.max_retries, 7);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.submit.proof_timeout_ms, 60_000);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\ninitial_delay_ms = 0\n").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("initial_delay_ms"));
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.retry.max_retries = 9;
        config.logging.format = "json".to_string();

        let rendered = config.to_toml().unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.retry.max_retries, 9);
        assert_eq!(reparsed.logging.format, "json");
    }
}
