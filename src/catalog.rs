//! Catalog Layer
//!
//! Top-level registry of origins. Orchestrates refresh cycles across every
//! configured backend and exposes metric lookup to concurrent readers.
//!
//! # Components
//!
//! - [`Catalog`]: origin registry, update orchestration, metric lookup
//! - [`Origin`] / [`RecordSink`]: per-origin ingestion pipeline
//! - [`FilterSet`]: ordered rename/discard rules for discovered names
//! - [`Source`] / [`Metric`] / [`CatalogRecord`]: catalog data model

mod error;
mod filter;
mod origin;
mod types;

pub use error::CatalogError;
pub use filter::{FilterOutcome, FilterSet};
pub use origin::{Origin, RecordSink};
pub use types::{CatalogRecord, Metric, Source};

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::config::{CatalogConfig, Config, OriginConfig};
use crate::connector::BackendRegistry;
use crate::plot::{PlotQuery, Series};

/// Result of refreshing a single origin during an update cycle.
#[derive(Debug)]
pub struct OriginOutcome {
    /// Origin name.
    pub origin: String,
    /// Refresh result for this origin.
    pub outcome: Result<(), CatalogError>,
}

/// Aggregated result of one full update cycle.
///
/// Origins fail independently; the report keeps every per-origin result so
/// operators can tell which backend is unhealthy.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Per-origin outcomes in refresh order.
    pub results: Vec<OriginOutcome>,
}

impl UpdateReport {
    /// Whether every origin refreshed successfully.
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_ok())
    }

    /// Origins that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CatalogError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.origin.as_str(), e)))
    }

    /// Last error encountered, if any.
    pub fn last_error(&self) -> Option<&CatalogError> {
        self.failures().last().map(|(_, e)| e)
    }
}

/// Top-level metric catalog.
///
/// Origins are registered through [`Catalog::add_origin`] (typically at
/// startup) and never removed during normal operation. Each origin's source
/// tree is mutated by its own ingestion task only, so the catalog itself can
/// be shared behind an `Arc` and queried concurrently.
pub struct Catalog {
    registry: BackendRegistry,
    origins: BTreeMap<String, Origin>,
    updated: RwLock<Option<DateTime<Utc>>>,
    channel_capacity: usize,
    refresh_timeout: Duration,
}

impl Catalog {
    /// Create an empty catalog with default settings.
    pub fn new(registry: BackendRegistry) -> Self {
        Self::with_config(registry, &CatalogConfig::default())
    }

    /// Create an empty catalog with explicit settings.
    pub fn with_config(registry: BackendRegistry, config: &CatalogConfig) -> Self {
        Self {
            registry,
            origins: BTreeMap::new(),
            updated: RwLock::new(None),
            channel_capacity: config.channel_capacity,
            refresh_timeout: config.refresh_timeout,
        }
    }

    /// Build a catalog from configuration, registering every origin.
    ///
    /// Must be called within a tokio runtime: each origin spawns its
    /// ingestion task at registration time.
    ///
    /// # Errors
    /// Fails on the first origin whose backend type is missing/unregistered,
    /// whose filter rules do not compile, or whose backend constructor
    /// reports an error.
    pub fn from_config(config: &Config, registry: BackendRegistry) -> Result<Self, CatalogError> {
        let mut catalog = Self::with_config(registry, &config.catalog);

        for (name, origin) in &config.origins {
            catalog.add_origin(name, origin)?;
        }

        Ok(catalog)
    }

    /// Register a new origin and start its ingestion task.
    ///
    /// On any failure the origin map is left untouched.
    ///
    /// # Errors
    /// - `DuplicateOrigin` if the name is taken
    /// - `MissingBackendType` / `UnknownBackendType` for bad `type` settings
    /// - `Config` if a filter rule does not compile
    /// - `Backend` with whatever the backend constructor reports
    pub fn add_origin(&mut self, name: &str, config: &OriginConfig) -> Result<(), CatalogError> {
        if self.origins.contains_key(name) {
            return Err(CatalogError::DuplicateOrigin(name.to_string()));
        }

        let kind = config
            .backend
            .kind()
            .ok_or_else(|| CatalogError::MissingBackendType(name.to_string()))?
            .to_string();

        if !self.registry.contains(&kind) {
            return Err(CatalogError::UnknownBackendType {
                origin: name.to_string(),
                kind,
            });
        }

        let filters = FilterSet::compile(&config.filters)?;

        let connector = self
            .registry
            .construct(&kind, name, &config.backend)
            .map_err(|source| CatalogError::Backend {
                origin: name.to_string(),
                source,
            })?;

        let origin = Origin::spawn(
            name,
            connector,
            filters,
            self.channel_capacity,
            self.refresh_timeout,
        );
        self.origins.insert(name.to_string(), origin);

        tracing::info!(origin = %name, backend = %kind, "origin registered");
        Ok(())
    }

    /// Look up an origin by name.
    pub fn origin(&self, name: &str) -> Option<&Origin> {
        self.origins.get(name)
    }

    /// Names of all registered origins.
    pub fn origin_names(&self) -> Vec<String> {
        self.origins.keys().cloned().collect()
    }

    /// Number of registered origins.
    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    /// Return a metric if the full origin/source/name path exists.
    ///
    /// Absence is a normal outcome: catalog state is expected to be
    /// incomplete or stale between refresh cycles.
    pub async fn get_metric(&self, origin: &str, source: &str, name: &str) -> Option<Metric> {
        match self.origins.get(origin) {
            Some(o) => o.metric(source, name).await,
            None => None,
        }
    }

    /// Whether a metric exists along the full path.
    pub async fn metric_exists(&self, origin: &str, source: &str, name: &str) -> bool {
        match self.origins.get(origin) {
            Some(o) => o.metric_exists(source, name).await,
            None => false,
        }
    }

    /// Time of the last fully successful update, if any.
    pub async fn updated(&self) -> Option<DateTime<Utc>> {
        *self.updated.read().await
    }

    /// Refresh every origin and aggregate the results.
    ///
    /// Origins are attempted sequentially in name order; a failing origin
    /// does not prevent the rest from being refreshed. The freshness
    /// timestamp advances only when every origin succeeded; successful
    /// origins keep their updated trees either way.
    pub async fn update(&self) -> UpdateReport {
        tracing::info!("catalog update started");

        let mut report = UpdateReport::default();
        for (name, origin) in &self.origins {
            let outcome = origin.refresh().await;
            if let Err(e) = &outcome {
                tracing::error!(origin = %name, error = %e, "origin refresh failed");
            }
            report.results.push(OriginOutcome {
                origin: name.clone(),
                outcome,
            });
        }

        if report.success() {
            *self.updated.write().await = Some(Utc::now());
            tracing::info!(origins = report.results.len(), "catalog update completed");
        } else {
            tracing::warn!(
                failed = report.failures().count(),
                origins = report.results.len(),
                "catalog update failed"
            );
        }

        report
    }

    /// Route a time-range query to an origin's connector.
    ///
    /// Every requested (source, metric) pair must already be cataloged; the
    /// query is then passed through unchanged.
    pub async fn plots(&self, origin: &str, query: &PlotQuery) -> Result<Vec<Series>, CatalogError> {
        let o = self
            .origins
            .get(origin)
            .ok_or_else(|| CatalogError::UnknownOrigin(origin.to_string()))?;

        for series in &query.series {
            if !o.metric_exists(&series.source, &series.metric).await {
                return Err(CatalogError::MetricNotFound {
                    origin: origin.to_string(),
                    source_name: series.source.clone(),
                    metric: series.metric.clone(),
                });
            }
        }

        o.connector()
            .plots(query)
            .await
            .map_err(|source| CatalogError::Backend {
                origin: origin.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("origins", &self.origin_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendSettings;
    use crate::connector::{Connector, ConnectorError, ConnectorRef};
    use std::sync::Arc;

    /// Connector emitting a fixed set of discovery pairs.
    struct StubConnector {
        name: String,
        pairs: Vec<(&'static str, &'static str)>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Connector for StubConnector {
        fn name(&self) -> &str {
            &self.name
        }

        async fn refresh(&self, sink: &RecordSink) -> Result<(), ConnectorError> {
            if self.fail {
                return Err(ConnectorError::Transport("backend unreachable".into()));
            }
            for (source, metric) in &self.pairs {
                sink.send(*source, *metric).await?;
            }
            Ok(())
        }

        async fn plots(&self, query: &PlotQuery) -> Result<Vec<Series>, ConnectorError> {
            Ok(query
                .series
                .iter()
                .map(|s| Series {
                    name: s.name.clone(),
                    step: query.step(),
                    plots: Vec::new(),
                })
                .collect())
        }
    }

    fn stub_registry() -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        registry
            .register("stub", |origin: &str, _settings: &BackendSettings| {
                Ok(Arc::new(StubConnector {
                    name: format!("stub/{origin}"),
                    pairs: vec![
                        ("host1", "cpu/idle"),
                        ("host1", "cpu/used"),
                        ("host2", "cpu/idle"),
                    ],
                    fail: false,
                }) as ConnectorRef)
            })
            .unwrap();
        registry
            .register("broken", |origin: &str, _settings: &BackendSettings| {
                Ok(Arc::new(StubConnector {
                    name: format!("broken/{origin}"),
                    pairs: Vec::new(),
                    fail: true,
                }) as ConnectorRef)
            })
            .unwrap();
        registry
    }

    fn origin_config(kind: &str) -> OriginConfig {
        OriginConfig {
            backend: BackendSettings::new().with("type", kind),
            filters: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_add_origin_unknown_type_leaves_catalog_unchanged() {
        let mut catalog = Catalog::new(stub_registry());

        let err = catalog.add_origin("o1", &origin_config("ghost")).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownBackendType { .. }));
        assert_eq!(catalog.origin_count(), 0);
    }

    #[tokio::test]
    async fn test_add_origin_missing_type() {
        let mut catalog = Catalog::new(stub_registry());
        let config = OriginConfig {
            backend: BackendSettings::new(),
            filters: Vec::new(),
        };

        let err = catalog.add_origin("o1", &config).unwrap_err();
        assert!(matches!(err, CatalogError::MissingBackendType(_)));
        assert_eq!(catalog.origin_count(), 0);
    }

    #[tokio::test]
    async fn test_add_origin_duplicate_name() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();

        let err = catalog.add_origin("o1", &origin_config("stub")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateOrigin(_)));
        assert_eq!(catalog.origin_count(), 1);
    }

    #[tokio::test]
    async fn test_update_populates_catalog() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();
        assert!(catalog.updated().await.is_none());

        let report = catalog.update().await;
        assert!(report.success());
        assert!(catalog.updated().await.is_some());

        assert!(catalog.metric_exists("o1", "host1", "cpu/idle").await);
        assert!(catalog.metric_exists("o1", "host1", "cpu/used").await);
        assert!(catalog.metric_exists("o1", "host2", "cpu/idle").await);
        assert!(!catalog.metric_exists("o1", "host2", "cpu/used").await);

        let origin = catalog.origin("o1").unwrap();
        assert_eq!(origin.source_count().await, 2);
        assert_eq!(origin.metric_count("host1").await, Some(2));
    }

    #[tokio::test]
    async fn test_update_with_failing_origin_keeps_siblings() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();
        catalog.add_origin("o2", &origin_config("broken")).unwrap();
        catalog.add_origin("o3", &origin_config("stub")).unwrap();

        let report = catalog.update().await;
        assert!(!report.success());
        assert_eq!(report.results.len(), 3);

        let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["o2"]);
        assert!(report.last_error().is_some());

        // Healthy siblings were still refreshed.
        assert!(catalog.metric_exists("o1", "host1", "cpu/idle").await);
        assert!(catalog.metric_exists("o3", "host1", "cpu/idle").await);

        // Freshness timestamp must not advance on partial failure.
        assert!(catalog.updated().await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_update_is_idempotent() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();

        catalog.update().await;
        let first = catalog.updated().await.unwrap();
        catalog.update().await;
        let second = catalog.updated().await.unwrap();
        assert!(second >= first);

        let origin = catalog.origin("o1").unwrap();
        assert_eq!(origin.source_count().await, 2);
        assert_eq!(origin.metric_count("host1").await, Some(2));
    }

    #[tokio::test]
    async fn test_get_metric_lookup_misses_are_not_errors() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();
        catalog.update().await;

        assert!(catalog.get_metric("o1", "host1", "cpu/idle").await.is_some());
        assert!(catalog.get_metric("o1", "host1", "nope").await.is_none());
        assert!(catalog.get_metric("o1", "ghost", "cpu/idle").await.is_none());
        assert!(catalog.get_metric("nope", "host1", "cpu/idle").await.is_none());
    }

    #[tokio::test]
    async fn test_plots_routes_through_origin_connector() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();
        catalog.update().await;

        let query = PlotQuery {
            series: vec![crate::plot::SeriesRef::new("idle", "host1", "cpu/idle")],
            sample: 60,
            start: Utc::now() - chrono::Duration::hours(1),
            end: Utc::now(),
        };

        let series = catalog.plots("o1", &query).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "idle");
    }

    #[tokio::test]
    async fn test_plots_rejects_uncataloged_metric() {
        let mut catalog = Catalog::new(stub_registry());
        catalog.add_origin("o1", &origin_config("stub")).unwrap();
        catalog.update().await;

        let query = PlotQuery {
            series: vec![crate::plot::SeriesRef::new("x", "host1", "ghost/metric")],
            sample: 60,
            start: Utc::now() - chrono::Duration::hours(1),
            end: Utc::now(),
        };

        let err = catalog.plots("o1", &query).await.unwrap_err();
        assert!(matches!(err, CatalogError::MetricNotFound { .. }));

        let err = catalog.plots("ghost", &query).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownOrigin(_)));
    }

    #[tokio::test]
    async fn test_filters_applied_during_update() {
        let mut catalog = Catalog::new(stub_registry());
        let config = OriginConfig {
            backend: BackendSettings::new().with("type", "stub"),
            filters: vec![
                crate::config::FilterConfig {
                    pattern: "^cpu/used$".to_string(),
                    discard: true,
                    rewrite: None,
                },
                crate::config::FilterConfig {
                    pattern: "^cpu/".to_string(),
                    discard: false,
                    rewrite: Some("proc/".to_string()),
                },
            ],
        };
        catalog.add_origin("o1", &config).unwrap();
        catalog.update().await;

        assert!(catalog.metric_exists("o1", "host1", "proc/idle").await);
        assert!(!catalog.metric_exists("o1", "host1", "cpu/idle").await);
        assert!(!catalog.metric_exists("o1", "host1", "cpu/used").await);
        assert!(!catalog.metric_exists("o1", "host1", "proc/used").await);

        let metric = catalog.get_metric("o1", "host1", "proc/idle").await.unwrap();
        assert_eq!(metric.original_name(), "cpu/idle");
    }
}
