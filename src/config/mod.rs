//! Sampling run configuration
//!
//! [`SamplerConfig`] can be built in code, starting from `Default`, or loaded from a JSON
//! file where every field is optional:
//!
//! ```json
//! {
//!   "package_name": "com.example.app",
//!   "interval_ms": 500,
//!   "metrics": { "fps": false, "gpu": true },
//!   "timestamp_format": { "kind": "raw" }
//! }
//! ```

/// Configuration defaults and limits
pub mod constants;

pub use constants::*;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::acquisition::{MetricFlags, DEFAULT_HDC_BINARY};
use crate::aggregate::TimestampFormat;
use crate::error::{Error, Result};

/// Configuration for one sampling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Bundle name of the application under test
    pub package_name: String,
    /// Time between tick starts
    pub interval_ms: u64,
    /// Metric groups requested from the device
    pub metrics: MetricFlags,
    /// Directory the series log and export are written to
    pub output_dir: PathBuf,
    /// File stem shared by `<stem>.csv` and `<stem>.json`
    pub series_file_stem: String,
    /// Timestamp rendering in the export
    pub timestamp_format: TimestampFormat,
    pub hdc_binary: String,
    /// Device to target when more than one is connected
    pub device_serial: Option<String>,
    /// Upper bound on a single acquisition call
    pub acquisition_timeout_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            interval_ms: DEFAULT_INTERVAL_MS,
            metrics: MetricFlags::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            series_file_stem: DEFAULT_SERIES_FILE_STEM.to_string(),
            timestamp_format: TimestampFormat::default(),
            hdc_binary: DEFAULT_HDC_BINARY.to_string(),
            device_serial: None,
            acquisition_timeout_ms: DEFAULT_ACQUISITION_TIMEOUT_MS,
        }
    }
}

impl SamplerConfig {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self { package_name: package_name.into(), ..Self::default() }
    }

    /// Loads and validates a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration, clamping the interval into range.
    ///
    /// An empty package name or file stem is an error.
    pub fn validate(&mut self) -> Result<()> {
        if self.package_name.trim().is_empty() {
            return Err(Error::invalid_data("package_name must not be empty"));
        }
        if self.series_file_stem.trim().is_empty() {
            return Err(Error::invalid_data("series_file_stem must not be empty"));
        }

        let clamped = self.interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS);
        if clamped != self.interval_ms {
            warn!(requested = self.interval_ms, clamped, "sampling interval out of range");
            self.interval_ms = clamped;
        }
        if self.acquisition_timeout_ms == 0 {
            self.acquisition_timeout_ms = DEFAULT_ACQUISITION_TIMEOUT_MS;
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_ms)
    }

    /// `<output_dir>/<stem>.csv`
    pub fn series_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.series_file_stem))
    }

    /// `<output_dir>/<stem>.json`
    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.series_file_stem))
    }
}
