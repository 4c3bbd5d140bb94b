//! Per-origin ingestion pipeline.
//!
//! Single-writer pattern: one long-lived tokio task owns the origin's source
//! tree and drains a bounded command channel. Connectors produce discovery
//! records through a [`RecordSink`]; readers observe the tree through a
//! read-write lock, so lookups racing the consumer stay consistent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::timeout;

use crate::catalog::error::CatalogError;
use crate::catalog::filter::{FilterOutcome, FilterSet};
use crate::catalog::types::{CatalogRecord, Metric, Source};
use crate::connector::{ConnectorError, ConnectorRef};

/// Commands processed by an origin's ingestion task.
#[derive(Debug)]
enum OriginCommand {
    /// Apply one discovery record to the source tree.
    Ingest(CatalogRecord),
    /// Acknowledge once every previously sent record has been applied.
    Sync(oneshot::Sender<()>),
}

/// Handle given to a connector during refresh for pushing discovery records.
///
/// Cloneable; any number of producers may feed the same origin. Sends block
/// when the channel is full, which is the back-pressure contract connectors
/// must tolerate.
#[derive(Clone)]
pub struct RecordSink {
    origin: String,
    connector: ConnectorRef,
    tx: mpsc::Sender<OriginCommand>,
}

impl RecordSink {
    /// Name of the origin this sink feeds.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Push one (source, metric) discovery pair into the origin's channel.
    ///
    /// The origin name and connector back-reference are attached here, so a
    /// connector only ever reports what it discovered.
    ///
    /// # Errors
    /// Returns `ConnectorError::ChannelClosed` if the ingestion task is gone.
    pub async fn send(
        &self,
        source: impl Into<String>,
        metric: impl Into<String>,
    ) -> Result<(), ConnectorError> {
        let record = CatalogRecord {
            origin: self.origin.clone(),
            source: source.into(),
            metric: metric.into(),
            connector: Arc::clone(&self.connector),
        };

        self.tx
            .send(OriginCommand::Ingest(record))
            .await
            .map_err(|_| ConnectorError::ChannelClosed)
    }
}

impl std::fmt::Debug for RecordSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSink")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// One configured backend instance and its catalog subtree.
///
/// The ingestion task spawned at construction is the sole writer of the
/// source tree and lives until the origin is dropped.
pub struct Origin {
    name: String,
    connector: ConnectorRef,
    sources: Arc<RwLock<HashMap<String, Source>>>,
    tx: mpsc::Sender<OriginCommand>,
    refresh_timeout: Duration,
}

impl Origin {
    /// Create the origin and spawn its ingestion task.
    pub(crate) fn spawn(
        name: impl Into<String>,
        connector: ConnectorRef,
        filters: FilterSet,
        channel_capacity: usize,
        refresh_timeout: Duration,
    ) -> Self {
        let name = name.into();
        let sources = Arc::new(RwLock::new(HashMap::new()));
        let (tx, rx) = mpsc::channel(channel_capacity);

        tokio::spawn(consume(name.clone(), filters, Arc::clone(&sources), rx));

        Self {
            name,
            connector,
            sources,
            tx,
            refresh_timeout,
        }
    }

    /// Origin name, unique within the catalog.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connector bound to this origin.
    pub fn connector(&self) -> ConnectorRef {
        Arc::clone(&self.connector)
    }

    /// Sink for pushing discovery records into this origin.
    pub fn sink(&self) -> RecordSink {
        RecordSink {
            origin: self.name.clone(),
            connector: Arc::clone(&self.connector),
            tx: self.tx.clone(),
        }
    }

    /// Run one refresh cycle against the bound connector.
    ///
    /// The connector call is bounded by the configured refresh deadline so a
    /// stalled backend cannot block catalog updates forever. Returns once
    /// every record emitted by the refresh has been applied to the tree.
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        let sink = self.sink();

        timeout(self.refresh_timeout, self.connector.refresh(&sink))
            .await
            .map_err(|_| CatalogError::RefreshTimeout {
                origin: self.name.clone(),
                timeout: self.refresh_timeout,
            })?
            .map_err(|source| CatalogError::Backend {
                origin: self.name.clone(),
                source,
            })?;

        self.sync().await
    }

    /// Wait until every record sent so far has been applied.
    ///
    /// The marker travels the same FIFO channel as the records, so the ack
    /// implies everything ahead of it was processed.
    pub async fn sync(&self) -> Result<(), CatalogError> {
        let (ack_tx, ack_rx) = oneshot::channel();

        self.tx
            .send(OriginCommand::Sync(ack_tx))
            .await
            .map_err(|_| CatalogError::ChannelClosed(self.name.clone()))?;

        timeout(self.refresh_timeout, ack_rx)
            .await
            .map_err(|_| CatalogError::RefreshTimeout {
                origin: self.name.clone(),
                timeout: self.refresh_timeout,
            })?
            .map_err(|_| CatalogError::ChannelClosed(self.name.clone()))
    }

    /// Look up a metric by source and resolved name.
    pub async fn metric(&self, source: &str, name: &str) -> Option<Metric> {
        self.sources
            .read()
            .await
            .get(source)
            .and_then(|s| s.metric(name))
            .cloned()
    }

    /// Whether a metric exists under this origin.
    pub async fn metric_exists(&self, source: &str, name: &str) -> bool {
        self.sources
            .read()
            .await
            .get(source)
            .is_some_and(|s| s.metric(name).is_some())
    }

    /// Number of sources currently cataloged.
    pub async fn source_count(&self) -> usize {
        self.sources.read().await.len()
    }

    /// Names of all sources currently cataloged.
    pub async fn source_names(&self) -> Vec<String> {
        self.sources.read().await.keys().cloned().collect()
    }

    /// Number of metrics under a source, if the source exists.
    pub async fn metric_count(&self, source: &str) -> Option<usize> {
        self.sources
            .read()
            .await
            .get(source)
            .map(Source::metric_count)
    }
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin")
            .field("name", &self.name)
            .field("connector", &self.connector.name())
            .finish_non_exhaustive()
    }
}

/// Ingestion loop: the sole writer of an origin's source tree.
async fn consume(
    origin: String,
    filters: FilterSet,
    sources: Arc<RwLock<HashMap<String, Source>>>,
    mut rx: mpsc::Receiver<OriginCommand>,
) {
    tracing::debug!(origin = %origin, "ingestion task started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            OriginCommand::Ingest(record) => {
                if record.source.is_empty() || record.metric.is_empty() {
                    tracing::debug!(
                        origin = %origin,
                        source = %record.source,
                        metric = %record.metric,
                        "dropping malformed discovery record"
                    );
                    continue;
                }

                let resolved = match filters.apply(&record.metric) {
                    FilterOutcome::Keep(name) => name,
                    FilterOutcome::Discard => continue,
                };

                let mut sources = sources.write().await;
                sources
                    .entry(record.source.clone())
                    .or_insert_with(|| Source::new(record.source.clone()))
                    .upsert_metric(resolved, record.metric, record.connector);
            }
            OriginCommand::Sync(ack) => {
                // Receiver may have given up waiting; nothing to do then.
                let _ = ack.send(());
            }
        }
    }

    tracing::debug!(origin = %origin, "ingestion task stopped");
}
