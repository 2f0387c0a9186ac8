/// Default sampling interval (milliseconds)
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Minimum sampling interval (milliseconds)
pub const MIN_INTERVAL_MS: u64 = 100;

/// Maximum sampling interval (milliseconds)
pub const MAX_INTERVAL_MS: u64 = 60_000;

/// Default upper bound on one acquisition call (milliseconds)
pub const DEFAULT_ACQUISITION_TIMEOUT_MS: u64 = 10_000;

/// Default directory series logs and exports are written to
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Default file stem of a run's series log and export
pub const DEFAULT_SERIES_FILE_STEM: &str = "perf";
