use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{DiagnosticSource, SpDaemonCommand};
use crate::config::SamplerConfig;
use crate::error::{Error, Result};

/// `hdc` looked up on `PATH`
pub const DEFAULT_HDC_BINARY: &str = "hdc";

/// Runs `SP_daemon` on a device via `hdc [-t <serial>] shell <command>`
#[derive(Debug, Clone)]
pub struct HdcShellSource {
    hdc_binary: String,
    device_serial: Option<String>,
    command: SpDaemonCommand,
}

impl HdcShellSource {
    pub fn new(hdc_binary: impl Into<String>, command: SpDaemonCommand) -> Self {
        Self { hdc_binary: hdc_binary.into(), device_serial: None, command }
    }

    /// Targets one device when several are connected
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.device_serial = Some(serial.into());
        self
    }

    pub fn from_config(config: &SamplerConfig) -> Self {
        let source = Self::new(&config.hdc_binary, SpDaemonCommand::new(&config.package_name, config.metrics));
        match &config.device_serial {
            Some(serial) => source.with_serial(serial),
            None => source,
        }
    }

    pub fn command(&self) -> &SpDaemonCommand {
        &self.command
    }

    /// Arguments passed to the `hdc` binary
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(serial) = &self.device_serial {
            args.push("-t".to_string());
            args.push(serial.clone());
        }
        args.push("shell".to_string());
        args.push(self.command.to_string());
        args
    }
}

#[async_trait]
impl DiagnosticSource for HdcShellSource {
    async fn acquire(&self) -> Result<String> {
        debug!(hdc = %self.hdc_binary, command = %self.command, "acquiring dump");

        let output = Command::new(&self.hdc_binary)
            .args(self.args())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::acquisition(format!("failed to run {}: {e}", self.hdc_binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "hdc shell failed");
            return Err(Error::acquisition(format!(
                "{} exited with {}: {}",
                self.hdc_binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::MetricFlags;

    fn command() -> SpDaemonCommand {
        SpDaemonCommand::new("com.example.app", MetricFlags::default())
    }

    #[test]
    fn test_args_without_serial() {
        let source = HdcShellSource::new(DEFAULT_HDC_BINARY, command());
        assert_eq!(source.args(), vec!["shell", "SP_daemon -PKG com.example.app -N 1 -c -r -f"]);
    }

    #[test]
    fn test_args_with_serial() {
        let source = HdcShellSource::new(DEFAULT_HDC_BINARY, command()).with_serial("FMR0223C13000649");
        assert_eq!(source.args()[..3], ["-t", "FMR0223C13000649", "shell"]);
    }

    #[test]
    fn test_from_config() {
        let config = SamplerConfig {
            package_name: "com.example.app".to_string(),
            device_serial: Some("abc".to_string()),
            ..SamplerConfig::default()
        };
        let source = HdcShellSource::from_config(&config);
        assert_eq!(source.command().package(), "com.example.app");
        assert_eq!(source.args()[1], "abc");
    }

    #[tokio::test]
    async fn test_missing_binary_is_acquisition_error() {
        let source = HdcShellSource::new("/nonexistent/hdc-binary", command());
        let err = source.acquire().await.unwrap_err();
        assert!(matches!(err, Error::Acquisition(_)));
        assert!(!err.is_tick_local());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_returned() {
        let source = HdcShellSource::new("echo", command());
        let dump = source.acquire().await.unwrap();
        assert_eq!(dump.trim(), "shell SP_daemon -PKG com.example.app -N 1 -c -r -f");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_acquisition_error() {
        let source = HdcShellSource::new("false", command());
        assert!(matches!(source.acquire().await, Err(Error::Acquisition(_))));
    }
}
