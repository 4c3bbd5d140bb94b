//! Time-series query types crossing the catalog/connector boundary.
//!
//! The catalog is a pass-through router keyed by origin/source/metric: it
//! validates that requested series are cataloged, hands the query to the
//! origin's connector, and never interprets point values.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One requested series within a plot query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRef {
    /// Caller-chosen name echoed back on the resulting series.
    pub name: String,
    /// Source the metric belongs to.
    pub source: String,
    /// Resolved metric name as stored in the catalog.
    pub metric: String,
}

impl SeriesRef {
    /// Create a series reference.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        metric: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            metric: metric.into(),
        }
    }
}

/// A time-range query for one or more cataloged series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotQuery {
    /// Requested series.
    pub series: Vec<SeriesRef>,
    /// Desired number of samples per series.
    pub sample: usize,
    /// Range start (inclusive).
    pub start: DateTime<Utc>,
    /// Range end (exclusive).
    pub end: DateTime<Utc>,
}

impl PlotQuery {
    /// Step size implied by the requested range and sample count.
    pub fn step(&self) -> Duration {
        let span = (self.end - self.start)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if self.sample == 0 {
            return Duration::ZERO;
        }
        span / self.sample as u32
    }
}

/// A single (timestamp, value) data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    /// Point timestamp (UTC).
    pub ts: DateTime<Utc>,
    /// Point value; semantics belong to the backend.
    pub value: f64,
}

/// A named sequence of points returned by a connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    /// Name from the matching [`SeriesRef`].
    pub name: String,
    /// Interval between consecutive points.
    #[serde(with = "humantime_serde")]
    pub step: Duration,
    /// Data points in ascending time order.
    pub plots: Vec<Plot>,
}
