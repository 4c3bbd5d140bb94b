//! Retina - Metric Catalog Engine
//!
//! This crate is the indexing and normalization core of a metrics-visualization
//! backend. It discovers which time series exist across one or more pluggable
//! monitoring backends, organizes them into an origin → source → metric
//! hierarchy, applies configurable rename/discard rules to discovered metric
//! names, and keeps the catalog fresh under periodic re-scans while remaining
//! safely queryable by concurrent readers.
//!
//! # Architecture
//!
//! - **Catalog**: top-level registry of origins; orchestrates updates and
//!   exposes metric lookup to concurrent readers
//! - **Origin**: per-backend catalog subtree fed by a dedicated ingestion task
//! - **Filters**: ordered rename/discard rules applied to discovered names
//! - **Connectors**: polymorphic backend plugins performing discovery and
//!   time-series queries, bound to origins through the backend registry
//! - **Config**: YAML-based origin, filter and backend settings
//!
//! # Example
//!
//! ```rust,ignore
//! use retina::{BackendRegistry, Catalog, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), retina::CatalogError> {
//!     let config = Config::load("configs/retina.yaml")?;
//!
//!     let mut registry = BackendRegistry::new();
//!     registry.register("influxdb", |origin, settings| {
//!         // wire up a concrete backend client here
//!         unimplemented!()
//!     })?;
//!
//!     let catalog = Catalog::from_config(&config, registry)?;
//!     let report = catalog.update().await;
//!     assert!(report.success());
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod connector;
pub mod plot;

pub use catalog::{
    Catalog, CatalogError, CatalogRecord, FilterOutcome, FilterSet, Metric, Origin, OriginOutcome,
    RecordSink, Source, UpdateReport,
};
pub use config::{BackendSettings, Config, ConfigError, FilterConfig, OriginConfig};
pub use connector::{BackendHandler, BackendRegistry, Connector, ConnectorError, ConnectorRef};
pub use plot::{Plot, PlotQuery, Series, SeriesRef};
