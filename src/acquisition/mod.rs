//! # Acquisition Module
//!
//! The boundary to the device. Each tick the pipeline asks a [`DiagnosticSource`] for one
//! opaque text dump and does not care how the text was obtained.
//!
//! [`HdcShellSource`] is the production source: it runs `SP_daemon` on the device through
//! `hdc shell`. Tests substitute scripted sources.
//!
//! ## Example
//!
//! ```rust
//! use harmony_metrics::acquisition::{MetricFlags, SpDaemonCommand};
//!
//! let command = SpDaemonCommand::new("com.example.app", MetricFlags::default());
//! assert_eq!(command.to_string(), "SP_daemon -PKG com.example.app -N 1 -c -r -f");
//! ```

mod hdc;

pub use hdc::{HdcShellSource, DEFAULT_HDC_BINARY};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[cfg(test)]
use mockall::automock;

/// On-device profiler binary
pub const SP_DAEMON: &str = "SP_daemon";

/// Produces one raw diagnostic dump per call
///
/// An `Err` means the channel itself is unusable (device gone, binary missing) and ends the
/// sampling run. A dump that merely fails to parse is not an error at this level.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DiagnosticSource: Send + Sync {
    async fn acquire(&self) -> Result<String>;
}

/// Which metric groups `SP_daemon` should report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricFlags {
    pub cpu: bool,
    pub memory: bool,
    pub fps: bool,
    pub net: bool,
    pub gpu: bool,
    pub temp: bool,
}

impl Default for MetricFlags {
    fn default() -> Self {
        Self { cpu: true, memory: true, fps: true, net: false, gpu: false, temp: false }
    }
}

impl MetricFlags {
    /// `SP_daemon` switches for the enabled groups, in the order the tool documents them
    pub fn switches(&self) -> Vec<&'static str> {
        [
            (self.cpu, "-c"),
            (self.memory, "-r"),
            (self.fps, "-f"),
            (self.net, "-net"),
            (self.gpu, "-g"),
            (self.temp, "-t"),
        ]
        .into_iter()
        .filter_map(|(enabled, switch)| enabled.then_some(switch))
        .collect()
    }
}

/// A single-shot `SP_daemon` invocation for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpDaemonCommand {
    package: String,
    flags: MetricFlags,
}

impl SpDaemonCommand {
    pub fn new(package: impl Into<String>, flags: MetricFlags) -> Self {
        Self { package: package.into(), flags }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn flags(&self) -> MetricFlags {
        self.flags
    }

    /// Argument vector, program name first
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![SP_DAEMON.to_string(), "-PKG".to_string(), self.package.clone(), "-N".to_string(), "1".to_string()];
        args.extend(self.flags.switches().into_iter().map(str::to_string));
        args
    }
}

impl fmt::Display for SpDaemonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}
