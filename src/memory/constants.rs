/// Suffix shared by every memory-pool column (`nativeHeapPss`, `gpuPss`, ...)
pub const PSS_SUFFIX: &str = "Pss";

/// Column holding the application's total proportional set size
pub const TOTAL_PSS_KEY: &str = "pss";

/// Lower-cased prefix of child-process memory columns, which are never aggregated
pub const CHILD_PREFIX: &str = "child";

/// Memory pool columns devices are known to report, in legend order
pub const KNOWN_POOLS: &[&str] =
    &["pss", "nativeHeapPss", "arktsHeapPss", "gpuPss", "graphicPss", "stackPss", "swapPss"];
