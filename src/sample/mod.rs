//! # Sample Module
//!
//! Assembles one sampling tick from a raw diagnostic dump:
//! tokenize, coerce, classify, then build the per-core records.
//!
//! A [`Sample`] is immutable once assembled. It is either appended to a
//! [`crate::store::SeriesStore`] or dropped when the dump carried no data.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use harmony_metrics::cpu::CoreRegistry;
//! use harmony_metrics::sample::SampleAssembler;
//! use harmony_metrics::core::types::TypedValue;
//!
//! let assembler = SampleAssembler::new(Arc::new(CoreRegistry::new()));
//! let sample = assembler
//!     .assemble("order:0 timestamp=1501839064260\norder:9 cpu0Frequency=1992000\norder:10 cpu0Usage=1.000000")
//!     .unwrap();
//!
//! assert_eq!(sample.timestamp, TypedValue::Integer(1501839064260));
//! assert_eq!(sample.cores[&0].frequency_hz, 1992000);
//! assert_eq!(sample.cores[&0].usage_pct, 1.0);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::classify::{classify, Bucket, CoreField, TIMESTAMP_KEY};
use crate::core::types::TypedValue;
use crate::cpu::{CoreMetric, CoreRecordBuilder, CoreRegistry};
use crate::error::{Error, Result};
use crate::parser::{coerce, tokenize};

/// A flattened `(column, value)` pair as written to the series store
pub type Cell = (String, TypedValue);

/// The unit of one sampling tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sample {
    /// Device-reported epoch value, kept exactly as coerced
    pub timestamp: TypedValue,
    pub system: IndexMap<String, TypedValue>,
    pub process: IndexMap<String, TypedValue>,
    /// Reserved for child-process fields; devices only ever report placeholders here
    pub child_processes: IndexMap<String, TypedValue>,
    pub cores: BTreeMap<usize, CoreMetric>,
    /// Keys no classification rule matched, preserved verbatim
    pub passthrough: IndexMap<String, TypedValue>,
}

impl Sample {
    /// The timestamp as integer milliseconds, if the device reported one
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.timestamp.as_i64()
    }

    /// Flattens the sample back into columns.
    ///
    /// Order: timestamp, system, process, child processes, cores by index (standard fields
    /// first, then extras), passthrough. Fields a core never reported come out as `Null`.
    pub fn flatten(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.len_hint());
        cells.push((TIMESTAMP_KEY.to_string(), self.timestamp.clone()));

        for bucket in [&self.system, &self.process, &self.child_processes] {
            cells.extend(bucket.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        for (&index, core) in &self.cores {
            for field in &CoreField::STANDARD {
                cells.push((field.key_for(index), core.value_of(field)));
            }
            for (name, value) in &core.extra {
                cells.push((CoreField::Other(name.clone()).key_for(index), value.clone()));
            }
        }

        cells.extend(self.passthrough.iter().map(|(k, v)| (k.clone(), v.clone())));
        cells
    }

    fn len_hint(&self) -> usize {
        1 + self.system.len()
            + self.process.len()
            + self.child_processes.len()
            + self.cores.values().map(|c| CoreField::STANDARD.len() + c.extra.len()).sum::<usize>()
            + self.passthrough.len()
    }
}

/// Builds [`Sample`]s from raw dumps, registering every core index it encounters
#[derive(Debug, Clone)]
pub struct SampleAssembler {
    registry: Arc<CoreRegistry>,
}

impl Default for SampleAssembler {
    fn default() -> Self {
        Self::new(CoreRegistry::global())
    }
}

impl SampleAssembler {
    pub fn new(registry: Arc<CoreRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CoreRegistry> {
        &self.registry
    }

    /// Assembles one tick.
    ///
    /// Fails with [`Error::MalformedDump`] when the dump has no data block and with
    /// [`Error::NoDataBlock`] when the block yields no tokens. Neither is fatal for a run.
    ///
    /// Every core index the registry already knows gets a record, so a tick that omits a
    /// core still produces that core's columns (as `Null`).
    pub fn assemble(&self, dump: &str) -> Result<Sample> {
        let tokens = tokenize(dump)?;
        if tokens.is_empty() {
            return Err(Error::NoDataBlock);
        }

        let mut sample = Sample::default();
        let mut cores = CoreRecordBuilder::new();

        for token in tokens {
            let value = coerce(&token.raw_value);
            match classify(&token.key) {
                Bucket::Timestamp => sample.timestamp = value,
                Bucket::System => {
                    sample.system.insert(token.key, value);
                },
                Bucket::Process => {
                    sample.process.insert(token.key, value);
                },
                Bucket::ChildProcess => {
                    sample.child_processes.insert(token.key, value);
                },
                Bucket::Core { index, field } => cores.record(index, &field, value),
                Bucket::Passthrough => {
                    sample.passthrough.insert(token.key, value);
                },
            }
        }

        for index in cores.indices().collect::<Vec<_>>() {
            if self.registry.observe(index) {
                debug!(core = index, "discovered cpu core");
            }
        }
        cores.ensure_cores(self.registry.indices());
        sample.cores = cores.finish();

        debug!(
            timestamp = %sample.timestamp,
            cores = sample.cores.len(),
            passthrough = sample.passthrough.len(),
            "assembled sample"
        );
        Ok(sample)
    }
}
