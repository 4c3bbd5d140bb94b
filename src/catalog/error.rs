//! Catalog-specific error types.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::connector::ConnectorError;

/// Errors that can occur in the catalog layer.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Origin configuration has no `type` key in its backend settings.
    #[error("origin '{0}': missing backend type")]
    MissingBackendType(String),

    /// Origin configuration names a backend type nobody registered.
    #[error("origin '{origin}': unknown backend type '{kind}'")]
    UnknownBackendType { origin: String, kind: String },

    /// An origin with the same name is already registered.
    #[error("origin '{0}' already registered")]
    DuplicateOrigin(String),

    /// Backend connector reported an error.
    #[error("origin '{origin}': {source}")]
    Backend {
        origin: String,
        #[source]
        source: ConnectorError,
    },

    /// Origin refresh exceeded its deadline.
    #[error("origin '{origin}': refresh timed out after {timeout:?}")]
    RefreshTimeout { origin: String, timeout: Duration },

    /// The origin's ingestion task is gone.
    #[error("origin '{0}': ingestion channel closed")]
    ChannelClosed(String),

    /// Requested origin is not part of the catalog.
    #[error("unknown origin '{0}'")]
    UnknownOrigin(String),

    /// Requested metric path is not cataloged.
    ///
    /// The field holding the source name is `source_name` rather than
    /// `source`, because thiserror treats a field named `source` as the
    /// error's cause.
    #[error("metric '{origin}/{source_name}/{metric}' not cataloged")]
    MetricNotFound {
        origin: String,
        source_name: String,
        metric: String,
    },

    /// Configuration error (invalid filter pattern, bad settings).
    #[error(transparent)]
    Config(#[from] ConfigError),
}
