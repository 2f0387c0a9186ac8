//! Diagnostic dump parsing
//!
//! This module turns the raw text an on-device diagnostic tool prints for one sampling tick
//! into ordered `key=value` tokens, and coerces each raw value into a [`TypedValue`].
//!
//! A dump looks like this (leading noise before the data block is ignored):
//!
//! ```text
//! set pkgname: com.example.app
//! order:0 timestamp=1501839064260
//! order:1 TotalcpuUsage=0.502513
//! order:9 cpu0Frequency=1992000
//! ```
//!
//! # Examples
//!
//! ```rust
//! use harmony_metrics::parser::{coerce, tokenize};
//! use harmony_metrics::core::types::TypedValue;
//!
//! let tokens = tokenize("order:0 timestamp=1501839064260\norder:1 fps=NA").unwrap();
//! assert_eq!(tokens[0].key, "timestamp");
//! assert_eq!(coerce(&tokens[0].raw_value), TypedValue::Integer(1501839064260));
//! assert_eq!(coerce(&tokens[1].raw_value), TypedValue::Null);
//! ```

use crate::core::types::TypedValue;
use crate::error::{Error, Result};

/// Ordinal prefix some tools put in front of every data line
pub const ORDER_MARKER: &str = "order:";

/// Raw value devices emit for an unavailable metric
pub const NA_VALUE: &str = "NA";

/// A raw `key=value` pair taken from one dump line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub key: String,
    pub raw_value: String,
}

impl Token {
    pub fn new(key: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self { key: key.into(), raw_value: raw_value.into() }
    }
}

/// Splits one dump into its ordered tokens.
///
/// The data block starts at the first `order:` line, or failing that at the first line that
/// already looks like `identifier=value` (spaces around `=` allowed). A dump with neither is a
/// [`Error::MalformedDump`]. Inside the block, lines without a `=` are skipped.
pub fn tokenize(dump: &str) -> Result<Vec<Token>> {
    let block = data_block(dump).ok_or_else(|| Error::malformed_dump("no data block found"))?;

    Ok(block.lines().filter_map(tokenize_line).collect())
}

/// Returns the dump from the first recognizable data line onwards
fn data_block(dump: &str) -> Option<&str> {
    if let Some(start) = dump.find(ORDER_MARKER) {
        return Some(&dump[start..]);
    }

    let mut offset = 0;
    for line in dump.split_inclusive('\n') {
        if is_key_value_line(line.trim()) {
            return Some(&dump[offset..]);
        }
        offset += line.len();
    }
    None
}

fn is_key_value_line(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, _)) => is_identifier(key.trim()),
        None => false,
    }
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Tokenizes a single line, `None` when the line carries no `key=value` pair
pub fn tokenize_line(line: &str) -> Option<Token> {
    let line = strip_order_prefix(line.trim());
    let (left, value) = line.split_once('=')?;

    // Whatever noise sits before the key, the key is the last word left of the separator
    let key = left.split_whitespace().last()?;
    Some(Token::new(key, value.trim()))
}

fn strip_order_prefix(line: &str) -> &str {
    match line.strip_prefix(ORDER_MARKER) {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            rest.trim_start()
        },
        None => line,
    }
}

/// Coerces one raw value. Total: every input maps to exactly one [`TypedValue`].
///
/// * `NA` becomes [`TypedValue::Null`]
/// * all digits becomes [`TypedValue::Integer`]
/// * digits with exactly one `.` becomes [`TypedValue::Float`]
/// * anything else, including numbers that overflow, stays a verbatim [`TypedValue::String`]
pub fn coerce(raw: &str) -> TypedValue {
    if raw == NA_VALUE {
        return TypedValue::Null;
    }

    let digits = raw.chars().filter(char::is_ascii_digit).count();
    let dots = raw.chars().filter(|c| *c == '.').count();
    let well_formed = digits > 0 && digits + dots == raw.len();

    if well_formed && dots == 0 {
        if let Ok(v) = raw.parse::<i64>() {
            return TypedValue::Integer(v);
        }
    } else if well_formed && dots == 1 {
        if let Ok(v) = raw.parse::<f64>() {
            return TypedValue::Float(v);
        }
    }

    TypedValue::String(raw.to_string())
}
