use std::fmt;

use serde::Serialize;

/// A memory pool a device reports proportional set size for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryPool {
    /// Whole-application PSS (`pss`)
    Total,
    NativeHeap,
    ArkTsHeap,
    Gpu,
    Graphic,
    Stack,
    Swap,
    /// Any other `<name>Pss` column, kept verbatim
    Other(String),
}

impl MemoryPool {
    /// Maps a memory column to its pool. The caller is expected to have checked
    /// [`super::is_memory_column`] first.
    pub fn from_column(column: &str) -> Self {
        match column {
            "pss" => Self::Total,
            "nativeHeapPss" => Self::NativeHeap,
            "arktsHeapPss" => Self::ArkTsHeap,
            "gpuPss" => Self::Gpu,
            "graphicPss" => Self::Graphic,
            "stackPss" => Self::Stack,
            "swapPss" => Self::Swap,
            other => Self::Other(other.to_string()),
        }
    }

    /// Human-readable legend label
    pub fn label(&self) -> &str {
        match self {
            Self::Total => "App memory",
            Self::NativeHeap => "Native memory",
            Self::ArkTsHeap => "ArkTS memory",
            Self::Gpu => "GPU memory",
            Self::Graphic => "Graphics memory",
            Self::Stack => "Stack memory",
            Self::Swap => "Swap memory",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for MemoryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
