//! Sub-configuration structs with engine defaults.

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry attempts after the first try
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Ceiling on the backoff delay in milliseconds
    pub max_delay_ms: u64,

    /// Multiplicative delay growth per attempt
    pub backoff_factor: f64,

    /// Randomize each delay within [0.5x, 1.5x]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Build the runtime policy for one invocation.
    ///
    /// The retryability override is not a config-file concern; attach one
    /// with [`RetryPolicy::retry_on`] afterwards if needed.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_factor: self.backoff_factor,
            jitter: self.jitter,
            retry_on: None,
        }
    }
}

/// Submission orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Proof generation timeout in milliseconds (the slow phase)
    pub proof_timeout_ms: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            proof_timeout_ms: 60_000,
        }
    }
}

impl SubmitConfig {
    /// Timeout for the proving phase.
    pub fn proof_timeout(&self) -> Duration {
        Duration::from_millis(self.proof_timeout_ms)
    }
}

/// Status reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Refresh interval for elapsed/countdown fields in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
        }
    }
}

impl StatusConfig {
    /// Interval between snapshot refreshes.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Output format ("pretty" or "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_to_policy() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 250,
            max_delay_ms: 10_000,
            backoff_factor: 1.5,
            jitter: false,
        };
        let policy = config.to_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_millis(10_000));
        assert!(policy.retry_on.is_none());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(RetryConfig::default().to_policy().validate().is_ok());
    }

    #[test]
    fn test_submit_defaults() {
        let config = SubmitConfig::default();
        assert_eq!(config.proof_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_status_tick_is_sub_second() {
        let config = StatusConfig::default();
        assert!(config.tick_interval() < Duration::from_secs(1));
    }
}
