use crate::protocols::thinkgear::{LengthByte, RawFrame, classify_length, layout};
use crate::source::{ByteSource, SourceError};

use super::cancel::CancelToken;
use super::stats::FrameStats;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScanOutcome {
    Frame(RawFrame),
    /// Length byte above the protocol limit; the frame was dropped.
    Oversized(u8),
    /// Cancellation observed during sync search or on an idle tick; any
    /// partial frame is dropped.
    Cancelled,
}

/// Pulls candidate frames off a byte source.
///
/// Sync search uses a two-byte sliding window, so any amount of leading
/// garbage is skipped. Checksums are not validated here.
pub(crate) struct FrameScanner<'a, S> {
    source: &'a mut S,
    cancel: &'a CancelToken,
    stats: &'a FrameStats,
}

impl<'a, S: ByteSource> FrameScanner<'a, S> {
    pub(crate) fn new(source: &'a mut S, cancel: &'a CancelToken, stats: &'a FrameStats) -> Self {
        Self {
            source,
            cancel,
            stats,
        }
    }

    pub(crate) fn next_frame(&mut self) -> Result<ScanOutcome, SourceError> {
        if !self.find_sync()? {
            return Ok(ScanOutcome::Cancelled);
        }

        let mut length = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(ScanOutcome::Cancelled),
        };
        if classify_length(length) == LengthByte::ExtendedSync {
            length = match self.read_byte()? {
                Some(byte) => byte,
                None => return Ok(ScanOutcome::Cancelled),
            };
        }
        let length = match classify_length(length) {
            LengthByte::Payload(length) => length,
            LengthByte::ExtendedSync | LengthByte::Oversized(_) => {
                return Ok(ScanOutcome::Oversized(length));
            }
        };

        let mut payload = Vec::with_capacity(length);
        for _ in 0..length {
            match self.read_byte()? {
                Some(byte) => payload.push(byte),
                None => return Ok(ScanOutcome::Cancelled),
            }
        }
        let checksum = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(ScanOutcome::Cancelled),
        };

        Ok(ScanOutcome::Frame(RawFrame { payload, checksum }))
    }

    /// Returns false when cancelled before a sync pair was found.
    ///
    /// Cancellation is checked on every byte here, not only on idle ticks,
    /// so a busy line that never syncs still stops promptly.
    fn find_sync(&mut self) -> Result<bool, SourceError> {
        let mut previous = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(false),
        };
        let mut skipped = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                self.stats.record_skipped(skipped + 1);
                return Ok(false);
            }
            let current = match self.read_byte()? {
                Some(byte) => byte,
                None => {
                    self.stats.record_skipped(skipped + 1);
                    return Ok(false);
                }
            };
            if previous == layout::SYNC && current == layout::SYNC {
                self.stats.record_skipped(skipped);
                return Ok(true);
            }
            skipped += 1;
            previous = current;
        }
    }

    /// Next byte, waiting through idle ticks. `None` means cancelled.
    fn read_byte(&mut self) -> Result<Option<u8>, SourceError> {
        loop {
            if let Some(byte) = self.source.next_byte()? {
                return Ok(Some(byte));
            }
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
        }
    }
}
