//! # Core Types Module
//!
//! Fundamental value types shared by the telemetry pipeline: the typed scalar every raw
//! diagnostic value is coerced into, and the unit wrappers used when normalizing samples
//! for export.
//!
//! ## Key Types
//!
//! * `TypedValue` - One coerced diagnostic value (integer, float, null or verbatim string)
//! * `Frequency` - A clock frequency stored in Hertz with MHz conversion
//! * `ByteSize` - A memory size stored in kilobytes with MB conversion
//! * `Percentage` - A usage/load percentage
//!
//! ## Example
//!
//! ```rust
//! use harmony_metrics::core::types::{ByteSize, Frequency};
//!
//! assert_eq!(Frequency::from_hz(1_992_000.0).as_mhz_rounded(), 1.99);
//! assert_eq!(ByteSize::from_kb(484_536.0).as_mb_rounded(), 473.18);
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

/// Hertz per megahertz
pub const HZ_PER_MHZ: f64 = 1_000_000.0;

/// Kilobytes per megabyte
pub const KB_PER_MB: f64 = 1024.0;

/// Rounds a value to two decimal places, the precision used for every exported number
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A diagnostic value after coercion
///
/// Every raw value maps to exactly one variant; see [`crate::parser::coerce`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypedValue {
    Integer(i64),
    Float(f64),
    #[default]
    Null,
    String(String),
}

impl TypedValue {
    /// Numeric view of the value, `None` for null and strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Null | Self::String(_) => None,
        }
    }

    /// Integer view of the value; floats are truncated
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(v) if v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }
}

/// Renders the value the way a device would print it.
///
/// Floats always carry a decimal point so that re-coercing the text yields a float again,
/// and null renders as `NA`.
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => {
                let text = v.to_string();
                if v.is_finite() && !text.contains('.') {
                    write!(f, "{text}.0")
                } else {
                    f.write_str(&text)
                }
            },
            Self::Null => f.write_str("NA"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Null => serializer.serialize_none(),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Represents a frequency reported by the device in Hertz
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Frequency(pub f64);

impl Frequency {
    pub fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    pub fn as_hz(&self) -> f64 {
        self.0
    }

    pub fn as_mhz(&self) -> f64 {
        self.0 / HZ_PER_MHZ
    }

    pub fn as_mhz_rounded(&self) -> f64 {
        round2(self.as_mhz())
    }
}

/// Represents a memory size reported by the device in kilobytes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ByteSize(pub f64);

impl ByteSize {
    pub fn from_kb(kb: f64) -> Self {
        Self(kb)
    }

    pub fn as_kb(&self) -> f64 {
        self.0
    }

    pub fn as_mb(&self) -> f64 {
        self.0 / KB_PER_MB
    }

    pub fn as_mb_rounded(&self) -> f64 {
        round2(self.as_mb())
    }
}

/// Represents a usage or load percentage as reported by the device
///
/// Device values are not clamped: a multi-core process load can legitimately exceed 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Percentage(pub f64);

impl Percentage {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    pub fn rounded(&self) -> f64 {
        round2(self.0)
    }
}
