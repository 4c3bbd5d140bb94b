//! Top-level configuration structures.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::origin::OriginConfig;
use super::validation::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Default capacity of each origin's ingestion channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default deadline for one origin's refresh cycle (30 seconds).
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_refresh_timeout() -> Duration {
    DEFAULT_REFRESH_TIMEOUT
}

// =============================================================================
// Catalog Configuration
// =============================================================================

/// Catalog engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Ingestion channel capacity per origin (default: 1024).
    ///
    /// Connectors block on send once the channel is full.
    pub channel_capacity: usize,

    /// Deadline for a single origin refresh cycle (default: "30s").
    #[serde(with = "humantime_serde")]
    pub refresh_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog engine settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Origin definitions keyed by origin name.
    #[serde(default)]
    pub origins: BTreeMap<String, OriginConfig>,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "catalog channel_capacity must be positive".to_string(),
            ));
        }

        if self.catalog.refresh_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "catalog refresh_timeout must be positive".to_string(),
            ));
        }

        for (name, origin) in &self.origins {
            if name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "origin name cannot be empty".to_string(),
                ));
            }
            origin.validate().map_err(|e| {
                ConfigError::ValidationError(format!("origin '{name}': {e}"))
            })?;
        }

        Ok(())
    }
}
