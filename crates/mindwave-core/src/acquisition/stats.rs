use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::protocols::thinkgear::ThinkGearError;

/// Live per-run counters, updated by the decode loop and readable from any
/// thread.
#[derive(Debug, Default)]
pub struct FrameStats {
    frames_decoded: AtomicU64,
    checksum_mismatches: AtomicU64,
    oversized_frames: AtomicU64,
    malformed_payloads: AtomicU64,
    bytes_skipped: AtomicU64,
    feed_overflows: AtomicU64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_decoded(&self) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oversized(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self, bytes: u64) {
        if bytes > 0 {
            self.bytes_skipped.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_feed_overflow(&self) {
        self.feed_overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self, err: &ThinkGearError) {
        let counter = match err {
            ThinkGearError::ChecksumMismatch { .. } => &self.checksum_mismatches,
            ThinkGearError::PayloadTooLong { .. } => &self.oversized_frames,
            ThinkGearError::Truncated { .. } => &self.malformed_payloads,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FrameCounters {
        FrameCounters {
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            checksum_mismatches: self.checksum_mismatches.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            malformed_payloads: self.malformed_payloads.load(Ordering::Relaxed),
            bytes_skipped: self.bytes_skipped.load(Ordering::Relaxed),
            feed_overflows: self.feed_overflows.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a run's frame counters.
///
/// # Examples
/// ```
/// use mindwave_core::FrameCounters;
///
/// let counters = FrameCounters {
///     frames_decoded: 10,
///     checksum_mismatches: 1,
///     oversized_frames: 0,
///     malformed_payloads: 2,
///     bytes_skipped: 7,
///     feed_overflows: 0,
/// };
/// assert_eq!(counters.discarded(), 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounters {
    /// Frames that passed the checksum and decoded cleanly.
    pub frames_decoded: u64,
    /// Frames dropped because the checksum did not match.
    pub checksum_mismatches: u64,
    /// Frames dropped because the length byte exceeded the protocol limit.
    pub oversized_frames: u64,
    /// Frames dropped because a record ran past the end of the payload.
    pub malformed_payloads: u64,
    /// Bytes consumed while hunting for sync.
    pub bytes_skipped: u64,
    /// Samples a full subscriber channel could not accept.
    pub feed_overflows: u64,
}

impl FrameCounters {
    pub fn discarded(&self) -> u64 {
        self.checksum_mismatches + self.oversized_frames + self.malformed_payloads
    }
}
