//! Origin configuration structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigError, expand_env_vars};

/// String key/value settings for a backend, including its `type`.
///
/// Recognized keys depend on the backend handler; typical entries are the
/// connection endpoint, credentials, target database and a series pattern.
/// Values read through [`BackendSettings::get`] and [`BackendSettings::require`]
/// have `${VAR}` / `${VAR:-default}` environment references expanded, so
/// credentials can be kept out of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendSettings(BTreeMap<String, String>);

impl BackendSettings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a setting, returning self for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The configured backend type, if present.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").map(String::as_str)
    }

    /// Get an optional setting with environment variables expanded.
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|v| expand_env_vars(v))
    }

    /// Get a mandatory setting with environment variables expanded.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if the key is absent.
    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::ValidationError(format!("missing backend setting '{key}'")))
    }
}

/// A single rename/discard rule applied to discovered metric names.
///
/// Exactly one of `discard` and `rewrite` must be set. Rule order within an
/// origin is significant: rules run in configured order against the current
/// (possibly already-rewritten) name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Regular expression matched against the metric name.
    pub pattern: String,

    /// Drop matching metrics instead of cataloging them.
    #[serde(default)]
    pub discard: bool,

    /// Replacement template; capture-group back-references (`$1`) supported.
    #[serde(default)]
    pub rewrite: Option<String>,
}

impl FilterConfig {
    /// Validate the rule shape and pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        regex::Regex::new(&self.pattern).map_err(|e| {
            ConfigError::ValidationError(format!("invalid filter pattern '{}': {e}", self.pattern))
        })?;

        match (self.discard, &self.rewrite) {
            (true, Some(_)) => Err(ConfigError::ValidationError(format!(
                "filter '{}': cannot specify both discard and rewrite",
                self.pattern
            ))),
            (false, None) => Err(ConfigError::ValidationError(format!(
                "filter '{}': must specify either discard or rewrite",
                self.pattern
            ))),
            _ => Ok(()),
        }
    }
}

/// Configuration for a single origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Backend settings, including the mandatory `type` key.
    pub backend: BackendSettings,

    /// Ordered filter rules applied to discovered metric names.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

impl OriginConfig {
    /// Validate backend settings and filter rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.kind().is_none_or(str::is_empty) {
            return Err(ConfigError::ValidationError(
                "missing backend type".to_string(),
            ));
        }

        for filter in &self.filters {
            filter.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_settings_kind() {
        let settings = BackendSettings::new()
            .with("type", "influxdb")
            .with("database", "metrics");

        assert_eq!(settings.kind(), Some("influxdb"));
        assert_eq!(settings.get("database").as_deref(), Some("metrics"));
        assert_eq!(settings.get("unknown"), None);
    }

    #[test]
    fn test_backend_settings_require_missing() {
        let settings = BackendSettings::new().with("type", "influxdb");

        let err = settings.require("database").unwrap_err();
        assert!(err.to_string().contains("missing backend setting"));
    }

    #[test]
    fn test_backend_settings_env_expansion() {
        let settings =
            BackendSettings::new().with("password", "${RETINA_TEST_MISSING_PW:-fallback}");

        assert_eq!(settings.get("password").as_deref(), Some("fallback"));
    }

    #[test]
    fn test_filter_config_discard_and_rewrite_exclusive() {
        let filter = FilterConfig {
            pattern: "^cpu".to_string(),
            discard: true,
            rewrite: Some("proc".to_string()),
        };

        let err = filter.validate().unwrap_err();
        assert!(err.to_string().contains("both discard and rewrite"));
    }

    #[test]
    fn test_filter_config_requires_an_action() {
        let filter = FilterConfig {
            pattern: "^cpu".to_string(),
            discard: false,
            rewrite: None,
        };

        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_filter_config_invalid_pattern() {
        let filter = FilterConfig {
            pattern: "(".to_string(),
            discard: true,
            rewrite: None,
        };

        let err = filter.validate().unwrap_err();
        assert!(err.to_string().contains("invalid filter pattern"));
    }

    #[test]
    fn test_origin_config_missing_type() {
        let config = OriginConfig {
            backend: BackendSettings::new().with("database", "metrics"),
            filters: vec![],
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("missing backend type"));
    }
}
