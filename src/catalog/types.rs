//! Core catalog data types.
//!
//! - [`CatalogRecord`]: discovery record crossing the connector → catalog boundary
//! - [`Metric`]: one named time series within a source
//! - [`Source`]: a monitored entity (typically a host) grouping its metrics

use std::collections::HashMap;
use std::sync::Arc;

use crate::connector::ConnectorRef;

/// A discovery record emitted by a connector during a refresh cycle.
///
/// This is the sole unit crossing the connector → catalog boundary inbound.
#[derive(Clone)]
pub struct CatalogRecord {
    /// Origin the record belongs to.
    pub origin: String,
    /// Source name, typically a host or instance identifier.
    pub source: String,
    /// Raw metric name as reported by the backend, before filtering.
    pub metric: String,
    /// Connector that can answer queries for this metric.
    pub connector: ConnectorRef,
}

impl std::fmt::Debug for CatalogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRecord")
            .field("origin", &self.origin)
            .field("source", &self.source)
            .field("metric", &self.metric)
            .field("connector", &self.connector.name())
            .finish()
    }
}

/// One named time series within a source.
#[derive(Clone)]
pub struct Metric {
    name: String,
    original_name: String,
    connector: ConnectorRef,
}

impl Metric {
    pub(crate) fn new(
        name: impl Into<String>,
        original_name: impl Into<String>,
        connector: ConnectorRef,
    ) -> Self {
        Self {
            name: name.into(),
            original_name: original_name.into(),
            connector,
        }
    }

    /// Resolved name the metric is stored under, unique within its source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pre-rewrite name as reported by the backend, kept for traceability.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Connector answering time-series queries for this metric.
    pub fn connector(&self) -> ConnectorRef {
        Arc::clone(&self.connector)
    }
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("original_name", &self.original_name)
            .field("connector", &self.connector.name())
            .finish()
    }
}

/// A monitored entity within an origin, grouping its metrics.
///
/// Created lazily the first time a discovery record names it. Metric names
/// are unique within a source; re-observing a (source, resolved name) pair
/// is an idempotent overwrite.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    metrics: HashMap<String, Metric>,
}

impl Source {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: HashMap::new(),
        }
    }

    /// Source name, unique within its origin.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upsert a metric under its resolved name.
    pub(crate) fn upsert_metric(
        &mut self,
        name: impl Into<String>,
        original_name: impl Into<String>,
        connector: ConnectorRef,
    ) {
        let name = name.into();
        let metric = Metric::new(name.clone(), original_name, connector);
        self.metrics.insert(name, metric);
    }

    /// Look up a metric by resolved name.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    /// Number of metrics under this source.
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Resolved names of all metrics under this source.
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.keys().cloned().collect()
    }
}
