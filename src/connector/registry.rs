//! Backend handler registry.
//!
//! Maps a configured backend `type` string to a constructor that wires up a
//! connector for an origin. Registration happens once per backend
//! implementation, before any origin referencing that type is created.

use std::collections::HashMap;

use crate::config::BackendSettings;
use crate::connector::{ConnectorError, ConnectorRef};

/// Constructor bound to a backend type.
///
/// Given the origin name and its backend settings, wires up and returns a
/// connector, or reports why construction failed (missing setting,
/// unreachable endpoint, invalid credentials).
pub type BackendHandler =
    Box<dyn Fn(&str, &BackendSettings) -> Result<ConnectorRef, ConnectorError> + Send + Sync>;

/// Registry of backend constructors keyed by type string.
#[derive(Default)]
pub struct BackendRegistry {
    handlers: HashMap<String, BackendHandler>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a backend type.
    ///
    /// # Errors
    /// Returns `ConnectorError::Registry` if the type is already registered.
    pub fn register<F>(&mut self, kind: impl Into<String>, handler: F) -> Result<(), ConnectorError>
    where
        F: Fn(&str, &BackendSettings) -> Result<ConnectorRef, ConnectorError>
            + Send
            + Sync
            + 'static,
    {
        let kind = kind.into();
        if self.handlers.contains_key(&kind) {
            return Err(ConnectorError::Registry(format!(
                "backend type '{kind}' already registered"
            )));
        }

        tracing::debug!(backend = %kind, "backend handler registered");
        self.handlers.insert(kind, Box::new(handler));
        Ok(())
    }

    /// Whether a backend type is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Construct a connector for an origin.
    ///
    /// # Errors
    /// Returns `ConnectorError::Registry` for an unknown type, or whatever
    /// error the handler itself reports.
    pub fn construct(
        &self,
        kind: &str,
        origin: &str,
        settings: &BackendSettings,
    ) -> Result<ConnectorRef, ConnectorError> {
        let handler = self.handlers.get(kind).ok_or_else(|| {
            ConnectorError::Registry(format!("unknown backend type '{kind}'"))
        })?;

        handler(origin, settings)
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RecordSink;
    use crate::connector::Connector;
    use crate::plot::{PlotQuery, Series};
    use std::sync::Arc;

    struct NullConnector {
        name: String,
    }

    #[async_trait::async_trait]
    impl Connector for NullConnector {
        fn name(&self) -> &str {
            &self.name
        }

        async fn refresh(&self, _sink: &RecordSink) -> Result<(), ConnectorError> {
            Ok(())
        }

        async fn plots(&self, _query: &PlotQuery) -> Result<Vec<Series>, ConnectorError> {
            Ok(Vec::new())
        }
    }

    fn null_handler(
        origin: &str,
        _settings: &BackendSettings,
    ) -> Result<ConnectorRef, ConnectorError> {
        Ok(Arc::new(NullConnector {
            name: format!("null/{origin}"),
        }))
    }

    #[test]
    fn test_register_and_construct() {
        let mut registry = BackendRegistry::new();
        registry.register("null", null_handler).unwrap();

        assert!(registry.contains("null"));
        assert!(!registry.contains("influxdb"));

        let connector = registry
            .construct("null", "o1", &BackendSettings::new())
            .unwrap();
        assert_eq!(connector.name(), "null/o1");
    }

    #[test]
    fn test_register_duplicate_type() {
        let mut registry = BackendRegistry::new();
        registry.register("null", null_handler).unwrap();

        let err = registry.register("null", null_handler).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_construct_unknown_type() {
        let registry = BackendRegistry::new();

        let err = registry
            .construct("ghost", "o1", &BackendSettings::new())
            .unwrap_err();
        assert!(err.to_string().contains("unknown backend type"));
    }

    #[test]
    fn test_handler_error_surfaces() {
        let mut registry = BackendRegistry::new();
        registry
            .register("broken", |_origin: &str, settings: &BackendSettings| {
                settings.require("database")?;
                unreachable!()
            })
            .unwrap();

        let err = registry
            .construct("broken", "o1", &BackendSettings::new())
            .unwrap_err();
        assert!(err.to_string().contains("missing backend setting"));
    }
}
