//! Configuration for splatedit-core
//!
//! Centralized configuration for index construction and point-cloud cleanup.
//! Loadable from JSON or TOML; call [`SplatEditConfig::validate`] after loading.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
#[serde(default)]
pub struct SplatEditConfig {
    /// Spatial index construction
    pub index: IndexConfig,
    /// Statistical outlier detection
    pub outliers: OutlierConfig,
}

/// How each tree level finds its median
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Linear-time median selection per subset, O(N log N) overall
    #[default]
    Select,
    /// Full sort of every subset, O(N log² N) overall
    Sort,
}

/// Spatial index construction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
#[serde(default)]
pub struct IndexConfig {
    /// Median finding strategy
    pub partition: PartitionStrategy,
}

/// Which points take part in outlier detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "snake_case")]
pub enum OutlierMode {
    /// Every point that is not deleted
    #[default]
    All,
    /// Only selected or locked points
    Selection,
}

/// Statistical outlier detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
#[serde(default)]
pub struct OutlierConfig {
    /// Neighbours averaged per point
    pub neighbors: u32,
    /// Standard deviations above the mean before a point counts as an outlier
    pub std_ratio: f64,
    /// Candidate points
    pub mode: OutlierMode,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            neighbors: 20,
            std_ratio: 2.0,
            mode: OutlierMode::All,
        }
    }
}

impl OutlierConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.neighbors == 0 {
            return Err(ConfigError::OutOfRange(
                "outliers.neighbors must be at least 1".to_string(),
            ));
        }

        if !self.std_ratio.is_finite() || self.std_ratio < 0.0 {
            return Err(ConfigError::OutOfRange(format!(
                "outliers.std_ratio must be a finite non-negative number, got {}",
                self.std_ratio
            )));
        }

        Ok(())
    }
}

impl SplatEditConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.outliers.validate()
    }
}
