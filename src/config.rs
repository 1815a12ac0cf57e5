//! Pipeline configuration
//!
//! Loaded from TOML. Every section except `[data]` is optional and falls back
//! to the defaults below; `[data]` is required only for file-based runs.

use crate::loader::DataSources;
use crate::policy::DeliveryTimePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main pipeline configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Input sources; relative paths resolve against the config file directory
    pub data: Option<DataSection>,
    #[serde(default)]
    pub clustering: ClusteringSection,
    #[serde(default)]
    pub delivery_time: DeliveryTimePolicy,
    #[serde(default)]
    pub validation: ValidationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    pub orders: PathBuf,
    pub geolocations: PathBuf,
    pub static_reference: PathBuf,
    pub inventory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusteringSection {
    /// H3 resolution (0 to 15)
    #[serde(default = "default_resolution")]
    pub resolution: u8,
}

fn default_resolution() -> u8 {
    6
}

impl Default for ClusteringSection {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationSection {
    /// Fail runs that lose or degrade data instead of only warning
    #[serde(default)]
    pub strict: bool,
    /// Priority level treated as high priority (case-insensitive)
    #[serde(default = "default_high_priority")]
    pub high_priority: String,
}

fn default_high_priority() -> String {
    "high".to_string()
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            strict: false,
            high_priority: default_high_priority(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// Data paths are left as written.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clustering.resolution > 15 {
            return Err(ConfigError::InvalidConfig(format!(
                "clustering.resolution must be between 0 and 15, got {}",
                self.clustering.resolution
            )));
        }

        self.delivery_time
            .validate()
            .map_err(|e| ConfigError::InvalidConfig(format!("delivery_time: {e}")))?;

        if self.validation.high_priority.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "validation.high_priority must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Input sources for a file-based run
    pub fn data_sources(&self) -> Result<DataSources, ConfigError> {
        let data = self.data.as_ref().ok_or_else(|| {
            ConfigError::InvalidConfig("[data] section is required to load input files".to_string())
        })?;

        Ok(DataSources {
            orders: data.orders.clone(),
            geolocations: data.geolocations.clone(),
            static_reference: data.static_reference.clone(),
            inventory: data.inventory.clone(),
        })
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        if let Some(data) = self.data.as_mut() {
            for path in [
                &mut data.orders,
                &mut data.geolocations,
                &mut data.static_reference,
                &mut data.inventory,
            ] {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[data]
orders = "orders.json"
geolocations = "geolocations.json"
static_reference = "static_reference_data.json"
inventory = "inventory.json"

[clustering]
resolution = 7
"#;
        Self::from_toml_str(toml_content).expect("Test config should parse")
    }
}
