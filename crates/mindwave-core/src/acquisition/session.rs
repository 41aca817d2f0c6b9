use time::OffsetDateTime;
use tracing::{debug, info, trace, warn};

use crate::protocols::thinkgear::decode_frame;
use crate::sample::DecodedSample;
use crate::source::{ByteSource, SourceError};

use super::cancel::CancelToken;
use super::scanner::{FrameScanner, ScanOutcome};
use super::sink::SampleSink;
use super::stats::{FrameCounters, FrameStats};

/// Why a decode loop returned.
#[derive(Debug)]
pub(crate) enum LoopExit {
    Cancelled,
    SourceEnded(SourceError),
}

/// Scan, validate, decode and deliver frames until cancelled or the source
/// fails. Per-frame problems are counted and skipped.
pub(crate) fn run_decode_loop<S: ByteSource>(
    source: &mut S,
    sink: &SampleSink,
    stats: &FrameStats,
    cancel: &CancelToken,
) -> LoopExit {
    let mut scanner = FrameScanner::new(source, cancel, stats);
    loop {
        if cancel.is_cancelled() {
            return LoopExit::Cancelled;
        }
        let frame = match scanner.next_frame() {
            Ok(ScanOutcome::Frame(frame)) => frame,
            Ok(ScanOutcome::Oversized(length)) => {
                stats.record_oversized();
                debug!(length, "discarding oversized frame");
                continue;
            }
            Ok(ScanOutcome::Cancelled) => return LoopExit::Cancelled,
            Err(err) => return LoopExit::SourceEnded(err),
        };

        match decode_frame(&frame) {
            Ok(readings) => {
                let sample = DecodedSample::new(OffsetDateTime::now_utc(), readings);
                trace!(readings = sample.readings().len(), "frame decoded");
                stats.record_decoded();
                sink.deliver(sample, stats);
            }
            Err(err) => {
                stats.record_rejected(&err);
                debug!(error = %err, "discarding frame");
            }
        }
    }
}

/// Decode a finite byte source to its end on the calling thread.
///
/// The source must end on its own: one that only ever reports idle ticks
/// keeps this call waiting. Use [`decode_source_until`] to bound it.
pub fn decode_source<S: ByteSource>(
    source: S,
    sink: &SampleSink,
) -> Result<FrameCounters, SourceError> {
    decode_source_until(source, sink, &CancelToken::new())
}

/// Decode a byte source on the calling thread until it ends or `cancel` is
/// set.
///
/// End of input is a normal end; any other source error is returned.
/// Feed subscribers are closed afterwards.
pub fn decode_source_until<S: ByteSource>(
    mut source: S,
    sink: &SampleSink,
    cancel: &CancelToken,
) -> Result<FrameCounters, SourceError> {
    let _feeds = sink.feeds_guard();
    let stats = FrameStats::new();
    let exit = run_decode_loop(&mut source, sink, &stats, cancel);

    if let Err(err) = source.close() {
        warn!(error = %err, "failed to close byte source");
    }

    let counters = stats.snapshot();
    match exit {
        LoopExit::SourceEnded(err) if !err.is_closed() => Err(err),
        _ => {
            info!(
                frames = counters.frames_decoded,
                discarded = counters.discarded(),
                "decode finished"
            );
            Ok(counters)
        }
    }
}
