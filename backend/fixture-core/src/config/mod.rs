pub mod launch;
pub mod server;

pub use launch::{LaunchConfig, LaunchOptions};
pub use server::ServerConfig;

use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "fixture.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixtureConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub launch: LaunchConfig,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            launch: LaunchConfig::default(),
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

// ============================================
// IMPLEMENTATION
// ============================================

impl FixtureConfig {
    /// Load config from {config_dir}/fixture.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(FixtureConfig)` if loaded successfully or defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but cannot be read, parsed or validated.
    #[track_caller]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        Self::parse(&contents, &config_path)
    }

    /// Parse and validate config JSON. `origin` is only used in error messages.
    #[track_caller]
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: FixtureConfig = serde_json::from_str(contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: origin.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", origin.display());
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Ports are deliberately not checked here: out-of-range ports are dropped
    /// when the argument list is built, never rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if let Some(ref cluster_id) = self.server.cluster_id
            && cluster_id.trim().is_empty()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "cluster_id cannot be empty string".to_string(),
            });
        }

        if let Some(ref executable) = self.launch.executable
            && executable.as_os_str().is_empty()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "launch.executable cannot be empty string".to_string(),
            });
        }

        Ok(())
    }
}
