use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::trace;

use crate::sample::{DecodedSample, Metric, Reading, SamplePoint};

use super::stats::FrameStats;
use super::store::TimeSeriesStore;

type Callback = Box<dyn FnMut(Reading) + Send>;

/// At most one observer per metric.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<Metric, Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when an earlier callback was replaced.
    pub fn register<F>(&mut self, metric: Metric, callback: F) -> bool
    where
        F: FnMut(Reading) + Send + 'static,
    {
        self.callbacks.insert(metric, Box::new(callback)).is_some()
    }

    pub fn unregister(&mut self, metric: Metric) -> bool {
        self.callbacks.remove(&metric).is_some()
    }

    pub fn dispatch(&mut self, reading: Reading) {
        if let Some(callback) = self.callbacks.get_mut(&reading.metric()) {
            callback(reading);
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut metrics: Vec<_> = self.callbacks.keys().collect();
        metrics.sort();
        f.debug_struct("CallbackRegistry")
            .field("metrics", &metrics)
            .finish()
    }
}

/// Receives decoded samples: dispatches callbacks, records history and fans
/// samples out to feed subscribers.
///
/// All methods take `&self`; the sink is shared between the caller and the
/// decode loop behind an `Arc`. History reads return copies, so they never
/// observe a half-written sample.
#[derive(Debug, Default)]
pub struct SampleSink {
    callbacks: Mutex<CallbackRegistry>,
    store: RwLock<TimeSeriesStore>,
    feeds: Mutex<Vec<Sender<DecodedSample>>>,
}

impl SampleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the observer for `metric`, replacing any earlier one.
    ///
    /// Callbacks run synchronously on the acquisition thread while the
    /// registry is locked: a slow callback stalls decoding, and a callback
    /// must not call back into `register`/`unregister`.
    pub fn register<F>(&self, metric: Metric, callback: F) -> bool
    where
        F: FnMut(Reading) + Send + 'static,
    {
        lock(&self.callbacks).register(metric, callback)
    }

    pub fn unregister(&self, metric: Metric) -> bool {
        lock(&self.callbacks).unregister(metric)
    }

    /// Subscribe to every decoded sample of the current or next run.
    ///
    /// The channel is closed when that run ends. Samples that do not fit in
    /// `capacity` are dropped for this subscriber and counted as feed
    /// overflows.
    pub fn subscribe(&self, capacity: usize) -> Receiver<DecodedSample> {
        let (tx, rx) = bounded(capacity.max(1));
        lock(&self.feeds).push(tx);
        rx
    }

    pub fn history(&self, metric: Metric) -> Vec<SamplePoint> {
        read(&self.store).history(metric).to_vec()
    }

    pub fn latest(&self, metric: Metric) -> Option<SamplePoint> {
        read(&self.store).latest(metric)
    }

    pub fn snapshot(&self) -> TimeSeriesStore {
        read(&self.store).clone()
    }

    pub fn reset(&self) {
        write(&self.store).clear();
    }

    pub(crate) fn deliver(&self, sample: DecodedSample, stats: &FrameStats) {
        {
            let mut callbacks = lock(&self.callbacks);
            for reading in sample.readings() {
                callbacks.dispatch(*reading);
            }
        }
        write(&self.store).record_sample(&sample);

        let mut feeds = lock(&self.feeds);
        if feeds.is_empty() {
            return;
        }
        feeds.retain(|tx| match tx.try_send(sample.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                stats.record_feed_overflow();
                trace!("feed subscriber full, sample dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub(crate) fn close_feeds(&self) {
        lock(&self.feeds).clear();
    }

    /// Closes the feeds when dropped, including while unwinding from a
    /// panicking callback.
    pub(crate) fn feeds_guard(&self) -> FeedsGuard<'_> {
        FeedsGuard { sink: self }
    }
}

pub(crate) struct FeedsGuard<'a> {
    sink: &'a SampleSink,
}

impl Drop for FeedsGuard<'_> {
    fn drop(&mut self) {
        self.sink.close_feeds();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use time::OffsetDateTime;

    use super::SampleSink;
    use crate::acquisition::stats::FrameStats;
    use crate::sample::{DecodedSample, Metric, Reading};

    fn sample(readings: Vec<Reading>) -> DecodedSample {
        DecodedSample::new(OffsetDateTime::now_utc(), readings)
    }

    #[test]
    fn dispatches_callback_and_records_history() {
        let sink = SampleSink::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        sink.register(Metric::Attention, move |reading| {
            seen_cb.lock().unwrap().push(reading);
        });

        let stats = FrameStats::new();
        sink.deliver(
            sample(vec![Reading::Attention(42), Reading::Meditation(7)]),
            &stats,
        );

        assert_eq!(*seen.lock().unwrap(), vec![Reading::Attention(42)]);
        assert_eq!(sink.history(Metric::Attention).len(), 1);
        assert_eq!(sink.latest(Metric::Meditation).unwrap().value, 7);
    }

    #[test]
    fn reregistering_replaces_callback() {
        let sink = SampleSink::new();
        let hits = Arc::new(Mutex::new((0, 0)));
        let first = Arc::clone(&hits);
        let second = Arc::clone(&hits);
        assert!(!sink.register(Metric::BlinkStrength, move |_| first.lock().unwrap().0 += 1));
        assert!(sink.register(Metric::BlinkStrength, move |_| second.lock().unwrap().1 += 1));

        sink.deliver(sample(vec![Reading::BlinkStrength(90)]), &FrameStats::new());
        assert_eq!(*hits.lock().unwrap(), (0, 1));
        assert!(sink.unregister(Metric::BlinkStrength));
        assert!(!sink.unregister(Metric::BlinkStrength));
    }

    #[test]
    fn full_subscriber_counts_overflow_without_blocking() {
        let sink = SampleSink::new();
        let stats = FrameStats::new();
        let rx = sink.subscribe(1);
        sink.deliver(sample(vec![Reading::Attention(1)]), &stats);
        sink.deliver(sample(vec![Reading::Attention(2)]), &stats);

        assert_eq!(rx.try_recv().unwrap().value(Metric::Attention), Some(1));
        assert!(rx.try_recv().is_err());
        assert_eq!(stats.snapshot().feed_overflows, 1);
        assert_eq!(sink.history(Metric::Attention).len(), 2);
    }

    #[test]
    fn dropped_subscriber_is_pruned_and_close_ends_stream() {
        let sink = SampleSink::new();
        let stats = FrameStats::new();
        drop(sink.subscribe(4));
        let rx = sink.subscribe(4);
        sink.deliver(sample(vec![Reading::Meditation(3)]), &stats);
        sink.close_feeds();

        assert!(rx.recv().is_ok());
        assert!(rx.recv().is_err());
        assert_eq!(stats.snapshot().feed_overflows, 0);
    }

    #[test]
    fn reset_clears_history() {
        let sink = SampleSink::new();
        sink.deliver(sample(vec![Reading::Theta(5)]), &FrameStats::new());
        assert!(!sink.snapshot().is_empty());
        sink.reset();
        assert!(sink.history(Metric::Theta).is_empty());
    }

    #[test]
    fn feeds_close_when_a_callback_panics() {
        let sink = SampleSink::new();
        let stats = FrameStats::new();
        let rx = sink.subscribe(4);
        sink.register(Metric::Attention, |_| panic!("callback failed"));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = sink.feeds_guard();
            sink.deliver(sample(vec![Reading::Attention(1)]), &stats);
        }));

        assert!(outcome.is_err());
        assert!(rx.recv().is_err());
    }
}
