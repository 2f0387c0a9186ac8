//! Memory pool columns
//!
//! Devices report memory as proportional set size in kilobytes, one column per pool
//! (`pss`, `nativeHeapPss`, `gpuPss`, ...). This module decides which columns are memory
//! pools and converts their values to megabytes.
//!
//! A column is a memory pool when it ends in `Pss` and does not start with `child`
//! (case-insensitive), or when it is exactly `pss`.
//!
//! # Examples
//!
//! ```rust
//! use harmony_metrics::memory::{display_label, is_memory_column, normalize_kb};
//!
//! assert!(is_memory_column("nativeHeapPss"));
//! assert!(!is_memory_column("childPss"));
//! assert_eq!(normalize_kb(484_536.0).as_mb_rounded(), 473.18);
//! assert_eq!(display_label("pss"), "App memory");
//! ```

/// Memory column naming constants
pub mod constants;

/// Memory pool types
pub mod types;

pub use constants::*;
pub use types::MemoryPool;

use crate::classify::CORE_MARKER;
use crate::core::types::ByteSize;

/// Whether a flat column holds a memory pool size
pub fn is_memory_column(column: &str) -> bool {
    if column == TOTAL_PSS_KEY {
        return true;
    }
    column.ends_with(PSS_SUFFIX) && !column.to_lowercase().starts_with(CHILD_PREFIX)
}

/// Interprets a raw memory value as kilobytes
pub fn normalize_kb(kb: f64) -> ByteSize {
    ByteSize::from_kb(kb)
}

/// Legend label for a memory column or a core name (`cpu3` becomes `CPU3`).
///
/// Names that are neither come back unchanged.
pub fn display_label(name: &str) -> String {
    if is_memory_column(name) {
        return MemoryPool::from_column(name).label().to_string();
    }
    if let Some(index) = core_name_index(name) {
        return format!("CPU{index}");
    }
    name.to_string()
}

fn core_name_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(CORE_MARKER)?;
    // `cpu0Usage` and friends are columns, not core names
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
