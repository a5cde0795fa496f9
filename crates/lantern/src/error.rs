//! Error types for the Lantern submission engine.
//!
//! Runtime failures of a submission never surface here: they are returned
//! as [`RetryOutcome`](crate::retry::RetryOutcome) /
//! [`SubmitOutcome`](crate::submit::SubmitOutcome) variants carrying a
//! [`ClassifiedError`](crate::classify::ClassifiedError). These types cover
//! the remaining fallible surface: configuration loading and engine setup.

use thiserror::Error;

/// Raw failure produced by a caller-supplied operation or phase.
///
/// The engine imposes no structure on the errors an operation returns; they
/// are normalized by [`classify`](crate::classify::classify) at the retry
/// boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for Lantern setup operations.
#[derive(Error, Debug)]
pub enum LanternError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Lantern results.
pub type Result<T> = std::result::Result<T, LanternError>;
