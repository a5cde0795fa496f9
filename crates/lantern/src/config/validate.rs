//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.initial_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "retry.initial_delay_ms must be > 0".into(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.max_delay_ms must be >= retry.initial_delay_ms".into(),
            ));
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.backoff_factor must be a finite value >= 1.0".into(),
            ));
        }
        if self.submit.proof_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "submit.proof_timeout_ms must be > 0".into(),
            ));
        }
        if self.status.tick_interval_ms == 0 || self.status.tick_interval_ms > 1000 {
            return Err(ConfigError::ValidationError(
                "status.tick_interval_ms must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_initial_delay() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("initial_delay_ms"));
    }

    #[test]
    fn test_validate_rejects_max_below_initial() {
        let mut config = Config::default();
        config.retry.initial_delay_ms = 5000;
        config.retry.max_delay_ms = 1000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_delay_ms"));
    }

    #[test]
    fn test_validate_rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.retry.backoff_factor = 0.9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backoff_factor"));

        config.retry.backoff_factor = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_proof_timeout() {
        let mut config = Config::default();
        config.submit.proof_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("proof_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_super_second_tick() {
        let mut config = Config::default();
        config.status.tick_interval_ms = 2000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tick_interval_ms"));

        config.status.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
