//! Configuration management for Coulomb
//!
//! This module handles loading, validation, and management of the engine
//! configuration from YAML files.

use crate::error::{CoulombError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Pricing configuration for session cost calculation
    pub pricing: PricingConfig,

    /// Charging session limits
    pub charging: ChargingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory for rotated files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Pricing configuration
///
/// The tariff is process-wide configuration; billing never hardcodes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Tariff applied to delivered energy, in currency units per kWh
    pub cost_per_kwh: f64,

    /// Currency symbol
    pub currency_symbol: String,
}

/// Charging session limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    /// Upper bound on a session's requested duration in minutes
    pub max_session_minutes: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/coulomb.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cost_per_kwh: 0.20,
            currency_symbol: "€".to_string(),
        }
    }
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            // One full day; requests beyond this are rejected as invalid
            max_session_minutes: 1440,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            pricing: PricingConfig::default(),
            charging: ChargingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations, falling back to
    /// built-in defaults when no file is present
    pub fn load() -> Result<Self> {
        let default_paths = [
            "coulomb_config.yaml",
            "/data/coulomb_config.yaml",
            "/etc/coulomb/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.logging.file.is_empty() {
            return Err(CoulombError::invalid_argument(
                "logging.file",
                "Log file path cannot be empty",
            ));
        }

        if self.pricing.cost_per_kwh < 0.0 {
            return Err(CoulombError::invalid_argument(
                "pricing.cost_per_kwh",
                "Tariff cannot be negative",
            ));
        }

        if self.charging.max_session_minutes == 0 {
            return Err(CoulombError::invalid_argument(
                "charging.max_session_minutes",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
