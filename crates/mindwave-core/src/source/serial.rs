use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use super::{Connector, ReaderSource, SourceError};

/// Baud rate of MindWave Mobile headsets over Bluetooth SPP.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;
/// Serial poll interval; bounds how long `stop()` waits on a silent line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);
/// A zero timeout would turn idle polling into a busy spin.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Opens a serial port (e.g. `/dev/rfcomm0`, `COM6`) for each acquisition
/// cycle. Resolving which port belongs to the headset is up to the caller.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialConnector {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Clamped to at least one millisecond.
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout.max(MIN_READ_TIMEOUT);
        self
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl Connector for SerialConnector {
    type Source = ReaderSource<Box<dyn SerialPort>>;

    fn open(&mut self) -> Result<Self::Source, SourceError> {
        info!(port = %self.port, baud_rate = self.baud_rate, "Opening serial port");
        let port = serialport::new(&self.port, self.baud_rate)
            .timeout(self.read_timeout)
            .open()?;
        Ok(ReaderSource::new(port))
    }

    fn describe(&self) -> String {
        format!("{}@{}", self.port, self.baud_rate)
    }
}
