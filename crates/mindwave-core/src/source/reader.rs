use std::io::{BufReader, ErrorKind, Read};

use super::{ByteSource, SourceError};

const READ_BUFFER_SIZE: usize = 4 * 1024;

/// `ByteSource` over any `std::io::Read`: files, in-memory buffers, serial
/// ports.
///
/// End of input maps to `SourceError::Closed`. Timeouts and interrupted
/// reads map to idle ticks.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use mindwave_core::{ByteSource, ReaderSource, SourceError};
///
/// let mut source = ReaderSource::new(Cursor::new(vec![0xAA]));
/// assert_eq!(source.next_byte().unwrap(), Some(0xAA));
/// assert!(matches!(source.next_byte(), Err(SourceError::Closed)));
/// ```
pub struct ReaderSource<R> {
    inner: Option<BufReader<R>>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Some(BufReader::with_capacity(READ_BUFFER_SIZE, reader)),
        }
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>, SourceError> {
        let reader = self.inner.as_mut().ok_or(SourceError::Closed)?;
        let mut byte = [0u8; 1];
        match reader.read(&mut byte) {
            Ok(0) => Err(SourceError::Closed),
            Ok(_) => Ok(Some(byte[0])),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(SourceError::Closed),
            Err(err) => Err(SourceError::Io(err)),
        }
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.inner = None;
        Ok(())
    }
}
