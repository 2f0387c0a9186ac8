use std::collections::VecDeque;

use async_trait::async_trait;
use harmony_metrics::acquisition::DiagnosticSource;
use harmony_metrics::{Error, Result};
use parking_lot::Mutex;

/// Serves a fixed list of dumps, then reports the device as gone
pub struct ScriptedSource {
    dumps: Mutex<VecDeque<String>>,
}

impl ScriptedSource {
    pub fn new(dumps: impl IntoIterator<Item = String>) -> Self {
        Self { dumps: Mutex::new(dumps.into_iter().collect()) }
    }
}

#[async_trait]
impl DiagnosticSource for ScriptedSource {
    async fn acquire(&self) -> Result<String> {
        self.dumps
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Acquisition("device disconnected".to_string()))
    }
}
