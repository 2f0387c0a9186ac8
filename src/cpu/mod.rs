//! # CPU Module
//!
//! Per-core CPU records built from `cpu<N><Metric>` keys, and the registry of core indices
//! discovered on the device.
//!
//! A device reports one group of keys per core:
//!
//! ```text
//! order:9 cpu0Frequency=1992000
//! order:10 cpu0Usage=1.000000
//! order:11 cpu0idleUsage=99.000000
//! ```
//!
//! ## Example
//!
//! ```rust
//! use harmony_metrics::classify::CoreField;
//! use harmony_metrics::core::types::TypedValue;
//! use harmony_metrics::cpu::CoreRecordBuilder;
//!
//! let mut builder = CoreRecordBuilder::default();
//! builder.record(0, &CoreField::Frequency, TypedValue::Integer(1_992_000));
//! builder.record(0, &CoreField::Usage, TypedValue::Float(1.0));
//!
//! let cores = builder.finish();
//! assert_eq!(cores[&0].frequency_hz, 1_992_000);
//! assert_eq!(cores[&0].usage_pct, 1.0);
//! ```

mod registry;
mod types;

pub use registry::CoreRegistry;
pub use types::CoreMetric;

use std::collections::BTreeMap;

use crate::classify::CoreField;
use crate::core::types::TypedValue;

/// Accumulates per-core fragments for one tick
#[derive(Debug, Default)]
pub struct CoreRecordBuilder {
    cores: BTreeMap<usize, CoreMetric>,
}

impl CoreRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field of one core, creating the zeroed record on first reference
    pub fn record(&mut self, index: usize, field: &CoreField, value: TypedValue) {
        self.cores.entry(index).or_default().set(field, value);
    }

    /// Makes sure a record exists for every given index, even if this tick never mentioned it
    pub fn ensure_cores(&mut self, indices: impl IntoIterator<Item = usize>) {
        for index in indices {
            self.cores.entry(index).or_default();
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cores.keys().copied()
    }

    pub fn finish(self) -> BTreeMap<usize, CoreMetric> {
        self.cores
    }
}

#[cfg(test)]
mod tests;
