use std::path::Path;
use std::time::Duration;

use anyhow::{Context, ensure};
use mindwave_core::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
use serde::Deserialize;

/// Default length of a timed capture.
pub const DEFAULT_DURATION_SECS: u64 = 60;
/// Default per-subscriber channel capacity for the capture feed.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub serial: SerialConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Serial port of the headset, e.g. `/dev/rfcomm0` or `COM6`
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Poll interval in milliseconds; bounds stop latency
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Capture length in seconds
    pub duration_secs: u64,
    /// Samples buffered for the report feed before overflow is counted
    pub feed_capacity: usize,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.serial.read_timeout_ms > 0,
            "serial.read_timeout_ms must be at least 1"
        );
        Ok(())
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}
