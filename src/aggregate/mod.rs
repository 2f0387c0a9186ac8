//! # Aggregate Module
//!
//! Turns a run's series into the normalized export: per-column points in device-independent
//! units plus a `{max, min, mean, name}` summary per column, grouped by [`MetricFamily`].
//!
//! There are two ways in, and they share every piece of arithmetic:
//!
//! * [`LiveAggregator`] accumulates rows as a run produces them
//! * [`aggregate_series`] / [`aggregate_file`] replay a completed series log
//!
//! Statistics run over unrounded normalized values and are rounded to two places at the end;
//! exported points are rounded individually. `Null`, empty and non-numeric cells are not
//! observations. A column with no observations does not appear at all, and neither does a
//! family without columns.
//!
//! ## Example
//!
//! ```rust
//! use harmony_metrics::aggregate::{LiveAggregator, MetricFamily, TimestampFormat};
//! use harmony_metrics::core::types::TypedValue;
//!
//! let mut live = LiveAggregator::new();
//! live.observe_row(&[
//!     ("timestamp".to_string(), TypedValue::Integer(1501839064260)),
//!     ("cpu0Frequency".to_string(), TypedValue::Integer(1992000)),
//!     ("pss".to_string(), TypedValue::Integer(484536)),
//! ]);
//!
//! let export = live.finish(TimestampFormat::Raw);
//! assert_eq!(export.family(MetricFamily::CpuFrequency)[0].max, 1.99);
//! assert_eq!(export.family(MetricFamily::Memory)[0].mean, 473.18);
//! ```

mod export;
mod family;
mod timestamp;

pub use export::{ColumnExport, Export};
pub use family::{MetricFamily, FPS_KEY};
pub use timestamp::{TimestampFormat, DEFAULT_UTC_OFFSET_MINUTES};

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::TIMESTAMP_KEY;
use crate::core::metrics::{Metric, MetricSeries};
use crate::core::types::{round2, TypedValue};
use crate::error::Result;
use crate::sample::{Cell, Sample};
use crate::store::{self, LoadedSeries};

/// Summary of one column over a run, in the family's unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateIndex {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub name: String,
}

/// Running max/min/sum/count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    max: f64,
    min: f64,
    sum: f64,
    count: usize,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self { max: f64::NEG_INFINITY, min: f64::INFINITY, sum: 0.0, count: 0 }
    }
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.max = self.max.max(value);
        self.min = self.min.min(value);
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Rounded summary, `None` without observations
    pub fn summarize(&self, name: impl Into<String>) -> Option<AggregateIndex> {
        let mean = self.mean()?;
        Some(AggregateIndex { max: round2(self.max), min: round2(self.min), mean: round2(mean), name: name.into() })
    }
}

#[derive(Debug)]
struct ColumnAccumulator {
    family: MetricFamily,
    points: MetricSeries<f64>,
    stats: RunningStats,
}

/// The state both aggregation paths feed
#[derive(Debug, Default)]
struct SeriesAccumulator {
    columns: IndexMap<String, ColumnAccumulator>,
}

impl SeriesAccumulator {
    fn observe_cells(&mut self, timestamp: &TypedValue, cells: &[Cell]) {
        for (column, value) in cells {
            self.observe(timestamp, column, value);
        }
    }

    fn observe(&mut self, timestamp: &TypedValue, column: &str, value: &TypedValue) {
        let Some(family) = MetricFamily::classify_column(column) else {
            return;
        };
        let Some(raw) = value.as_f64() else {
            return;
        };

        let normalized = family.normalize(raw);
        let column = self.columns.entry(column.to_string()).or_insert_with(|| ColumnAccumulator {
            family,
            points: MetricSeries::new(),
            stats: RunningStats::default(),
        });
        column.stats.push(normalized);
        column.points.add(Metric::with_timestamp(round2(normalized), timestamp.clone()));
    }

    fn finish(self, format: TimestampFormat) -> Export {
        let columns = self
            .columns
            .into_iter()
            .filter_map(|(name, mut column)| {
                let index = column.stats.summarize(column.family.index_name(&name))?;
                column.points.map_timestamps(|ts| format.render(ts));
                Some((name, ColumnExport { family: column.family, data: column.points, index }))
            })
            .collect();
        Export::from_columns(columns)
    }
}

/// Incremental aggregation over a run in progress
#[derive(Debug, Default)]
pub struct LiveAggregator {
    acc: SeriesAccumulator,
    ticks: usize,
}

impl LiveAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sample: &Sample) {
        self.acc.observe_cells(&sample.timestamp, &sample.flatten());
        self.ticks += 1;
    }

    /// Observes a flattened row, e.g. the one a [`crate::store::SeriesStore`] just wrote
    pub fn observe_row(&mut self, cells: &[Cell]) {
        let timestamp = row_timestamp(cells);
        self.acc.observe_cells(&timestamp, cells);
        self.ticks += 1;
    }

    /// Rows observed so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn finish(self, format: TimestampFormat) -> Export {
        debug!(ticks = self.ticks, columns = self.acc.columns.len(), "finishing live aggregation");
        self.acc.finish(format)
    }
}

fn row_timestamp(cells: &[Cell]) -> TypedValue {
    cells.iter().find(|(column, _)| column == TIMESTAMP_KEY).map(|(_, ts)| ts.clone()).unwrap_or_default()
}

/// Aggregates a completed series in one pass
pub fn aggregate_series(series: &LoadedSeries, format: TimestampFormat) -> Export {
    let mut acc = SeriesAccumulator::default();
    for (timestamp, cells) in series.iter_rows() {
        acc.observe_cells(&timestamp, &cells);
    }
    debug!(rows = series.len(), columns = acc.columns.len(), "finished batch aggregation");
    acc.finish(format)
}

/// Loads a series log and aggregates it
pub fn aggregate_file(path: impl AsRef<Path>, format: TimestampFormat) -> Result<Export> {
    let series = store::load(path)?;
    Ok(aggregate_series(&series, format))
}
