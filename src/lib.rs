//! Harmony Metrics - device telemetry parsing and aggregation for HarmonyOS performance runs
//!
//! This crate turns the loosely structured text an on-device profiler (`SP_daemon`) prints at
//! every sampling tick into typed samples, appends them to a CSV series log, and summarizes a
//! run into a normalized export (MHz for frequency, MB for memory, percent for load).
//!
//! # Pipeline
//!
//! ```text
//! dump -> parser (tokenize + coerce) -> classify -> cpu (core records) -> sample
//!      -> store (append) -> aggregate (live or batch) -> export JSON
//! ```
//!
//! The [`scheduler`] drives the first half on a background task at a fixed cadence and runs
//! the aggregation when it is stopped. The [`aggregate`] module can also replay a completed
//! log on its own; both paths produce identical numbers.
//!
//! # Examples
//!
//! ```rust
//! use harmony_metrics::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let sample = SampleAssembler::default().assemble(
//!         "order:0 timestamp=1501839064260\norder:9 cpu0Frequency=1992000\norder:10 cpu0Usage=1.000000",
//!     )?;
//!
//!     let mut live = LiveAggregator::new();
//!     live.observe(&sample);
//!     let export = live.finish(TimestampFormat::default());
//!
//!     assert_eq!(export.family(MetricFamily::CpuFrequency)[0].max, 1.99);
//!     Ok(())
//! }
//! ```
//!
//! Running a sampling session against a connected device:
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use harmony_metrics::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SamplerConfig::new("com.example.app");
//!     let source = Arc::new(HdcShellSource::from_config(&config));
//!
//!     let mut scheduler = SamplingScheduler::new(config, source);
//!     scheduler.start()?;
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!
//!     if let Some(report) = scheduler.stop().await? {
//!         println!("{} of {} ticks recorded", report.ticks_ok, report.ticks_total());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Failures that only cost one tick ([`Error::MalformedDump`], [`Error::NoDataBlock`],
//! [`Error::SeriesWrite`]) never end a run. Only [`Error::Acquisition`] does.

pub mod acquisition;
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod core;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod parser;
pub mod sample;
pub mod scheduler;
pub mod store;

pub use error::{Error, Result};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::acquisition::{DiagnosticSource, HdcShellSource, MetricFlags, SpDaemonCommand};
    pub use crate::aggregate::{
        aggregate_file, aggregate_series, AggregateIndex, Export, LiveAggregator, MetricFamily, TimestampFormat,
    };
    pub use crate::config::SamplerConfig;
    pub use crate::core::prelude::*;
    pub use crate::cpu::{CoreMetric, CoreRegistry};
    pub use crate::sample::{Sample, SampleAssembler};
    pub use crate::scheduler::{RunReport, SamplingScheduler, SchedulerState};
    pub use crate::store::{load, LoadedSeries, RowSink, SeriesStore};
    pub use crate::{Error, Result};
}
