//! Bridge configuration (hostlink.toml)
//!
//! ```toml
//! strict_arity = false
//! proxy_maps = true
//! enumerate_map_keys = true
//! max_arguments = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Behavior switches of a [`Bridge`](crate::Bridge)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Reject calls passing more arguments than a non-variadic function declares
    #[serde(default)]
    pub strict_arity: bool,

    /// Proxy nested maps; when off they marshal to `null`
    #[serde(default = "default_true")]
    pub proxy_maps: bool,

    /// Report map keys from the `ownKeys` trap
    #[serde(default = "default_true")]
    pub enumerate_map_keys: bool,

    /// Upper bound on the argument count of any host call
    #[serde(default = "default_max_arguments")]
    pub max_arguments: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_arguments() -> usize {
    256
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            strict_arity: false,
            proxy_maps: true,
            enumerate_map_keys: true,
            max_arguments: default_max_arguments(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_arguments == 0 {
            return Err(ConfigError::ValidationError(
                "max_arguments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
