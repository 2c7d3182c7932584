//! Configuration management for Altomatic.
//!
//! Configuration is loaded from a TOML file in the platform config directory
//! with sensible defaults. All config structs implement `Default`, so a
//! partial file only overrides what it names.

mod credentials;
mod types;
mod validate;

pub use credentials::{
    process_env, resolve_credential, resolve_env_var, Credentials, EnvLookup, Readiness,
};
pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Altomatic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider selection and write policy
    pub generation: GenerationConfig,

    /// Per-provider credentials
    pub providers: ProvidersConfig,

    /// Batch dispatch settings
    pub dispatch: DispatchConfig,

    /// Request timeouts
    pub limits: LimitsConfig,

    /// Catalog and audit database locations
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(&Self::default_path())
    }

    /// Load configuration from `path`, or defaults if it doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.altomatic.altomatic/config.toml
    /// - Linux: ~/.config/altomatic/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\altomatic\config\config.toml
    ///
    /// Falls back to ~/.altomatic/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "altomatic", "altomatic")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".altomatic").join("config.toml")
            })
    }

    /// Resolved catalog file path (with ~ expansion).
    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.catalog_path).into_owned())
    }

    /// Resolved audit database path (with ~ expansion).
    pub fn audit_db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.audit_db_path).into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
