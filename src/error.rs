use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dump carried no recognizable `order:` / `key=value` block
    #[error("Malformed dump: {0}")]
    MalformedDump(String),

    /// A data block was found but yielded no usable tokens
    #[error("No data block in dump")]
    NoDataBlock,

    #[error("Series write failed for {path}: {reason}")]
    SeriesWrite { path: String, reason: String },

    /// The diagnostic channel itself is gone; terminates a sampling run
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    pub(crate) fn malformed_dump<S: Into<String>>(msg: S) -> Self {
        Error::MalformedDump(msg.into())
    }

    pub(crate) fn series_write(path: &Path, reason: impl ToString) -> Self {
        Error::SeriesWrite { path: path.display().to_string(), reason: reason.to_string() }
    }

    pub(crate) fn acquisition<S: Into<String>>(msg: S) -> Self {
        Error::Acquisition(msg.into())
    }

    pub(crate) fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Error::InvalidData(msg.into())
    }

    pub(crate) fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Whether this error only costs the current tick rather than the whole run
    pub fn is_tick_local(&self) -> bool {
        matches!(self, Error::MalformedDump(_) | Error::NoDataBlock | Error::SeriesWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
