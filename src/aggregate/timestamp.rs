use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::TypedValue;
use crate::error::{Error, Result};

/// UTC offset reports are rendered in unless configured otherwise (+08:00)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// How tick timestamps appear in the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimestampFormat {
    /// The device-reported value, untouched
    Raw,
    /// Millisecond epoch rendered as ISO-8601 with milliseconds at a fixed offset
    Iso8601 { offset_minutes: i32 },
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self::Iso8601 { offset_minutes: DEFAULT_UTC_OFFSET_MINUTES }
    }
}

impl TimestampFormat {
    /// Renders one timestamp. Values that are not integer milliseconds pass through unchanged.
    pub fn render(&self, timestamp: &TypedValue) -> TypedValue {
        match self {
            Self::Raw => timestamp.clone(),
            Self::Iso8601 { offset_minutes } => match timestamp {
                TypedValue::Integer(ms) => render_iso8601(*ms, *offset_minutes)
                    .map(TypedValue::String)
                    .unwrap_or_else(|| timestamp.clone()),
                other => other.clone(),
            },
        }
    }
}

fn render_iso8601(ms: i64, offset_minutes: i32) -> Option<String> {
    let offset = FixedOffset::east_opt(offset_minutes.checked_mul(60)?)?;
    let utc = DateTime::<Utc>::from_timestamp_millis(ms)?;
    Some(utc.with_timezone(&offset).format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string())
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Iso8601 { offset_minutes } => {
                let sign = if *offset_minutes < 0 { '-' } else { '+' };
                let abs = offset_minutes.unsigned_abs();
                write!(f, "iso8601{sign}{:02}:{:02}", abs / 60, abs % 60)
            },
        }
    }
}

/// Accepts `raw`, `iso8601` (default offset) or `iso8601+HH:MM` / `iso8601-HH:MM`
impl FromStr for TimestampFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("raw") {
            return Ok(Self::Raw);
        }

        let rest = s
            .strip_prefix("iso8601")
            .ok_or_else(|| Error::invalid_data(format!("unknown timestamp format: {s}")))?;
        if rest.is_empty() {
            return Ok(Self::default());
        }

        let (sign, hhmm) = if let Some(hhmm) = rest.strip_prefix('+') {
            (1, hhmm)
        } else if let Some(hhmm) = rest.strip_prefix('-') {
            (-1, hhmm)
        } else {
            return Err(Error::invalid_data(format!("bad offset in timestamp format: {s}")));
        };
        let (hours, minutes) = hhmm
            .split_once(':')
            .and_then(|(h, m)| Some((h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)))
            .filter(|(h, m)| (0..=23).contains(h) && (0..60).contains(m))
            .ok_or_else(|| Error::invalid_data(format!("bad offset in timestamp format: {s}")))?;

        Ok(Self::Iso8601 { offset_minutes: sign * (hours * 60 + minutes) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_renders_at_plus_eight() {
        let rendered = TimestampFormat::default().render(&TypedValue::Integer(1_501_839_064_260));
        assert_eq!(rendered, TypedValue::from("2017-08-04T17:31:04.260+08:00"));
    }

    #[test]
    fn test_raw_and_non_integer_pass_through() {
        let ts = TypedValue::Integer(1_501_839_064_260);
        assert_eq!(TimestampFormat::Raw.render(&ts), ts);

        let text = TypedValue::from("2025-06-28T11:22:54.174+0800");
        assert_eq!(TimestampFormat::default().render(&text), text);
        assert_eq!(TimestampFormat::default().render(&TypedValue::Null), TypedValue::Null);
    }

    #[test]
    fn test_negative_offset() {
        let format = TimestampFormat::Iso8601 { offset_minutes: -330 };
        assert_eq!(format.render(&TypedValue::Integer(0)), TypedValue::from("1969-12-31T18:30:00.000-05:30"));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("raw".parse::<TimestampFormat>().unwrap(), TimestampFormat::Raw);
        assert_eq!("iso8601".parse::<TimestampFormat>().unwrap(), TimestampFormat::default());
        assert_eq!(
            "iso8601-05:30".parse::<TimestampFormat>().unwrap(),
            TimestampFormat::Iso8601 { offset_minutes: -330 }
        );
        assert_eq!(TimestampFormat::default().to_string(), "iso8601+08:00");
        assert!("iso8601+25:00".parse::<TimestampFormat>().is_err());
        assert!("unix".parse::<TimestampFormat>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&TimestampFormat::default()).unwrap();
        assert_eq!(json, r#"{"kind":"iso8601","offset_minutes":480}"#);
        let raw: TimestampFormat = serde_json::from_str(r#"{"kind":"raw"}"#).unwrap();
        assert_eq!(raw, TimestampFormat::Raw);
    }
}
