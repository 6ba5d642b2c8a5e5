//! Configuration management.
//!
//! Acquisition thresholds are configuration rather than constants; the
//! defaults match the values the attendance screens have been running with.

use crate::policy::PolicyRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[cfg(feature = "toml")]
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Policy used when no policy store is attached (CLI runs)
    #[serde(default)]
    pub policy: Option<PolicyRecord>,
}

/// Thresholds for selecting the best position sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Stop polling once a sample is at least this accurate (meters)
    #[serde(default = "default_target_accuracy")]
    pub target_accuracy_m: f64,
    /// Fixes less accurate than this are flagged unreliable (meters)
    #[serde(default = "default_max_acceptable_accuracy")]
    pub max_acceptable_accuracy_m: f64,
    /// Maximum number of samples to consider
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wall-clock limit for one acquisition (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_target_accuracy() -> f64 {
    100.0
}

fn default_max_acceptable_accuracy() -> f64 {
    5000.0
}

fn default_max_attempts() -> u32 {
    10
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            target_accuracy_m: default_target_accuracy(),
            max_acceptable_accuracy_m: default_max_acceptable_accuracy(),
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AcquisitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_accuracy_m.is_finite() || self.target_accuracy_m <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "acquisition.target_accuracy_m must be positive, got {}",
                self.target_accuracy_m
            )));
        }
        if !self.max_acceptable_accuracy_m.is_finite()
            || self.max_acceptable_accuracy_m < self.target_accuracy_m
        {
            return Err(ConfigError::ValidationError(format!(
                "acquisition.max_acceptable_accuracy_m must be at least the target accuracy ({}), got {}",
                self.target_accuracy_m, self.max_acceptable_accuracy_m
            )));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "acquisition.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "acquisition.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.acquisition.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }
        if let Some(policy) = &self.policy {
            policy
                .resolve()
                .map_err(|e| ConfigError::ValidationError(format!("policy: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.acquisition.target_accuracy_m, 100.0);
        assert_eq!(config.acquisition.max_acceptable_accuracy_m, 5000.0);
        assert_eq!(config.acquisition.max_attempts, 10);
        assert_eq!(config.acquisition.timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, "info");
        assert!(config.policy.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let config = AcquisitionConfig {
            max_attempts: 0,
            ..AcquisitionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_ceiling_below_target() {
        let config = AcquisitionConfig {
            target_accuracy_m: 200.0,
            max_acceptable_accuracy_m: 50.0,
            ..AcquisitionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml_str(
            r#"
            [acquisition]
            target_accuracy_m = 50.0

            [logging]
            json = true

            [policy]
            geolocation_enabled = true
            latitude = 41.3111
            longitude = 69.2797
            geolocation_radius = 500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.acquisition.target_accuracy_m, 50.0);
        assert_eq!(config.acquisition.max_attempts, 10);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
        assert!(config.policy.unwrap().resolve().unwrap().enabled);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_with_incomplete_policy_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [policy]
            geolocation_enabled = true
            latitude = 41.3111
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("policy"));
    }
}
