/// # Core Metrics Module
///
/// Timestamped measurements and the series they form. A sampling run produces one
/// [`MetricSeries`] per exported column; the timestamp is the device-reported value of the
/// tick the measurement came from, kept as coerced so that formatting stays an export concern.
///
/// ## Example
///
/// ```rust
/// use harmony_metrics::core::metrics::{Metric, MetricSeries};
/// use harmony_metrics::core::types::TypedValue;
///
/// let mut usage = MetricSeries::new();
/// usage.add(Metric::with_timestamp(33.98, TypedValue::Integer(1_501_839_064_260)));
/// assert_eq!(usage.latest().map(|m| m.value), Some(33.98));
/// ```
use serde::Serialize;

use crate::core::types::TypedValue;

/// A single metric measurement with a timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric<T> {
    /// The timestamp of the tick that produced the value
    pub timestamp: TypedValue,
    /// The value of the metric
    pub value: T,
}

impl<T> Metric<T> {
    /// Creates a new metric with a specific timestamp
    pub fn with_timestamp(value: T, timestamp: TypedValue) -> Self {
        Self { timestamp, value }
    }
}

/// A series of metrics over time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricSeries<T> {
    /// The collection of metrics in this series
    pub metrics: Vec<Metric<T>>,
}

impl<T> Default for MetricSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MetricSeries<T> {
    /// Creates a new empty metric series
    pub fn new() -> Self {
        Self { metrics: Vec::new() }
    }

    /// Adds a metric to the series
    pub fn add(&mut self, metric: Metric<T>) {
        self.metrics.push(metric);
    }

    /// Returns the most recent metric in the series, if any
    pub fn latest(&self) -> Option<&Metric<T>> {
        self.metrics.last()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Rewrites every timestamp in place
    pub fn map_timestamps(&mut self, f: impl Fn(&TypedValue) -> TypedValue) {
        for metric in &mut self.metrics {
            metric.timestamp = f(&metric.timestamp);
        }
    }
}
