use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::info;

use super::{AggregateIndex, MetricFamily};
use crate::core::metrics::MetricSeries;
use crate::error::Result;

/// One exported column: its normalized points and their summary
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnExport {
    pub family: MetricFamily,
    pub data: MetricSeries<f64>,
    pub index: AggregateIndex,
}

/// The normalized aggregate document handed to report renderers
///
/// Serializes as a single JSON object. Each aggregated column maps to
/// `{"data": [{timestamp, value}...], "index": {max, min, mean, name}}`, and each family with at
/// least one observed column maps its index key (`cpuFreqIndex`, ...) to
/// `{"data": [{max, min, mean, name}...]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Export {
    columns: IndexMap<String, ColumnExport>,
}

impl Export {
    pub(crate) fn from_columns(columns: IndexMap<String, ColumnExport>) -> Self {
        Self { columns }
    }

    /// True when no column had a single observation
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnExport> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnExport)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Summaries of one family, in column order
    pub fn family(&self, family: MetricFamily) -> Vec<&AggregateIndex> {
        self.columns.values().filter(|c| c.family == family).map(|c| &c.index).collect()
    }

    /// Families with at least one summary, in export order
    pub fn families(&self) -> Vec<MetricFamily> {
        MetricFamily::ALL.into_iter().filter(|f| self.columns.values().any(|c| c.family == *f)).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_pretty()?)?;
        info!(path = %path.display(), columns = self.columns.len(), "wrote aggregate export");
        Ok(())
    }
}

#[derive(Serialize)]
struct ColumnBody<'a> {
    data: &'a MetricSeries<f64>,
    index: &'a AggregateIndex,
}

#[derive(Serialize)]
struct FamilyBody<'a> {
    data: Vec<&'a AggregateIndex>,
}

impl Serialize for Export {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let families = self.families();
        let mut map = serializer.serialize_map(Some(self.columns.len() + families.len()))?;

        for (name, column) in &self.columns {
            map.serialize_entry(name, &ColumnBody { data: &column.data, index: &column.index })?;
        }
        for family in families {
            map.serialize_entry(family.index_key(), &FamilyBody { data: self.family(family) })?;
        }
        map.end()
    }
}
