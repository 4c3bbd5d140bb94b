//! Configuration module for the catalog engine.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Catalog settings (ingestion channel capacity, refresh deadline)
//! - Origin definitions (backend settings, filter rules)

mod app;
mod origin;
mod validation;

pub use app::{CatalogConfig, Config};
pub use origin::{BackendSettings, FilterConfig, OriginConfig};
pub use validation::{ConfigError, expand_env_vars};

// Re-export constants
pub use app::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_REFRESH_TIMEOUT};
