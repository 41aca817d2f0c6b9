mod reader;
mod serial;

pub use reader::ReaderSource;
pub use serial::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, SerialConnector};

use thiserror::Error;

/// Ordered, blocking byte stream feeding the frame scanner.
///
/// `next_byte` returns `Ok(None)` when no byte arrived within the source's
/// poll interval; the scanner uses these idle ticks to observe cancellation.
/// Any `Err` is terminal for the acquisition cycle.
pub trait ByteSource: Send {
    fn next_byte(&mut self) -> Result<Option<u8>, SourceError>;

    fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Opens a fresh `ByteSource` for each acquisition cycle.
pub trait Connector {
    type Source: ByteSource + 'static;

    fn open(&mut self) -> Result<Self::Source, SourceError>;

    /// Human-readable endpoint used in logs and reports.
    fn describe(&self) -> String {
        "byte source".to_string()
    }
}

impl<F, S> Connector for F
where
    F: FnMut() -> Result<S, SourceError>,
    S: ByteSource + 'static,
{
    type Source = S;

    fn open(&mut self) -> Result<S, SourceError> {
        self()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("byte source closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl SourceError {
    /// True when the stream simply ended rather than failing.
    pub fn is_closed(&self) -> bool {
        matches!(self, SourceError::Closed)
    }
}
