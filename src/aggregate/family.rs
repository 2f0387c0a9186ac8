use std::fmt;

use serde::Serialize;

use crate::classify::{parse_core_key, CoreField, CORE_MARKER, TIMESTAMP_KEY};
use crate::core::types::{ByteSize, Frequency, Percentage};
use crate::memory::is_memory_column;

/// Frame-rate column reported by `SP_daemon -f`
pub const FPS_KEY: &str = "fps";

/// A group of columns summarized together under one export index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricFamily {
    /// `cpu<N>Frequency`, Hz in, MHz out
    CpuFrequency,
    /// `cpu<N>Usage`, percent in and out
    CpuLoad,
    /// `pss` and `<pool>Pss`, KB in, MB out
    Memory,
    /// `fps`, frames per second
    Fps,
}

impl MetricFamily {
    /// Families in export order
    pub const ALL: [MetricFamily; 4] = [Self::CpuFrequency, Self::CpuLoad, Self::Memory, Self::Fps];

    /// Which family a flat column belongs to, if any.
    ///
    /// Both aggregation paths go through this one function.
    pub fn classify_column(column: &str) -> Option<Self> {
        if column == TIMESTAMP_KEY {
            return None;
        }

        match parse_core_key(column).map(|(_, suffix)| CoreField::from_suffix(suffix)) {
            Some(CoreField::Frequency) => return Some(Self::CpuFrequency),
            Some(CoreField::Usage) => return Some(Self::CpuLoad),
            _ => {},
        }

        if is_memory_column(column) {
            Some(Self::Memory)
        } else if column == FPS_KEY {
            Some(Self::Fps)
        } else {
            None
        }
    }

    /// Key of this family's summary in the export document
    pub fn index_key(&self) -> &'static str {
        match self {
            Self::CpuFrequency => "cpuFreqIndex",
            Self::CpuLoad => "cpuCoreLoadIndex",
            Self::Memory => "memAppInfoIndex",
            Self::Fps => "FPSIndex",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::CpuFrequency => "MHz",
            Self::CpuLoad => "%",
            Self::Memory => "MB",
            Self::Fps => "fps",
        }
    }

    /// Converts a raw device value into the family's unit, without rounding
    pub fn normalize(&self, raw: f64) -> f64 {
        match self {
            Self::CpuFrequency => Frequency::from_hz(raw).as_mhz(),
            Self::CpuLoad => Percentage::new(raw).as_f64(),
            Self::Memory => ByteSize::from_kb(raw).as_mb(),
            Self::Fps => raw,
        }
    }

    /// Name a column's summary is listed under: `cpu<N>` for CPU families, the column otherwise
    pub fn index_name(&self, column: &str) -> String {
        match self {
            Self::CpuFrequency | Self::CpuLoad => match parse_core_key(column) {
                Some((index, _)) => format!("{CORE_MARKER}{index}"),
                None => column.to_string(),
            },
            Self::Memory | Self::Fps => column.to_string(),
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.index_key())
    }
}
