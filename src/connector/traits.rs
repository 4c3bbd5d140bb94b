//! Core connector trait and error types.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::RecordSink;
use crate::config::ConfigError;
use crate::plot::{PlotQuery, Series};

/// Errors that can occur inside a backend connector.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Network I/O error.
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// Backend transport or protocol error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid backend settings.
    #[error("invalid settings: {0}")]
    Settings(#[from] ConfigError),

    /// Time-series query failed backend-side.
    #[error("query error: {0}")]
    Query(String),

    /// Backend registry error.
    #[error("registry error: {0}")]
    Registry(String),

    /// The origin's ingestion channel is closed.
    #[error("ingestion channel closed")]
    ChannelClosed,
}

/// Polymorphic capability implemented by every backend plugin.
///
/// A connector is bound to exactly one origin at construction time through
/// the backend registry. `refresh` must be safe to call repeatedly; the
/// catalog bounds each call with a deadline, so implementations should not
/// retry indefinitely on their own.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Stable identifier for diagnostics.
    fn name(&self) -> &str;

    /// Enumerate every available series backend-side, pushing one discovery
    /// record per metric into the origin's ingestion channel.
    ///
    /// Sends block once the channel is full; the consumer task drains it
    /// concurrently, so a blocked send is transient under normal operation.
    async fn refresh(&self, sink: &RecordSink) -> Result<(), ConnectorError>;

    /// Answer a time-range query for previously cataloged metrics.
    ///
    /// Returns one series per requested (source, metric) pair, or the
    /// backend's error as-is. The catalog does not interpret point values.
    async fn plots(&self, query: &PlotQuery) -> Result<Vec<Series>, ConnectorError>;
}

impl std::fmt::Debug for dyn Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Shared reference to a connector instance.
///
/// Every metric routes its queries back through the connector bound to its
/// origin; the reference is attached to each discovery record at ingestion.
pub type ConnectorRef = Arc<dyn Connector>;
