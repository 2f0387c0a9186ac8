/// Builder for `SP_daemon`-style dumps
pub struct TestDumpBuilder {
    timestamp: i64,
    cores: Vec<(u64, String)>,
    lines: Vec<(String, String)>,
    noise: Option<String>,
}

impl TestDumpBuilder {
    /// Create a new builder with a fixed timestamp and no metrics
    pub fn new(timestamp: i64) -> Self {
        Self { timestamp, cores: Vec::new(), lines: Vec::new(), noise: None }
    }

    /// Add a core with the given frequency (Hz) and usage (raw text, e.g. `1.000000` or `NA`)
    pub fn core(mut self, frequency_hz: u64, usage: &str) -> Self {
        self.cores.push((frequency_hz, usage.to_string()));
        self
    }

    /// Add an arbitrary `key=value` line
    pub fn metric(mut self, key: &str, value: &str) -> Self {
        self.lines.push((key.to_string(), value.to_string()));
        self
    }

    /// Prefix the data block with a line of tool chatter
    pub fn noise(mut self, text: &str) -> Self {
        self.noise = Some(text.to_string());
        self
    }

    pub fn build(self) -> String {
        let mut entries = vec![("timestamp".to_string(), self.timestamp.to_string())];
        for (index, (frequency, usage)) in self.cores.into_iter().enumerate() {
            entries.push((format!("cpu{index}Frequency"), frequency.to_string()));
            entries.push((format!("cpu{index}Usage"), usage));
            entries.push((format!("cpu{index}idleUsage"), "50.000000".to_string()));
        }
        entries.extend(self.lines);

        let mut dump = String::new();
        if let Some(noise) = self.noise {
            dump.push_str(&noise);
            dump.push('\n');
        }
        for (order, (key, value)) in entries.into_iter().enumerate() {
            dump.push_str(&format!("  order:{order} {key}={value}\n"));
        }
        dump
    }
}
