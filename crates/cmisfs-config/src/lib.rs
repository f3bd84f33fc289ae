pub mod types;
mod validation;

use std::path::Path;

pub use types::*;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Connection '{0}' referenced by storage '{1}' is not defined")]
    UndefinedConnection(String, String),

    #[error("Connection '{0}' has an invalid url: {1}")]
    InvalidConnectionUrl(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StorageConfig {
    /// Parse a storage configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: StorageConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load a storage configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
