use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use thiserror::Error;
use tracing::{info, warn};

use crate::sample::{DecodedSample, Metric, Reading, SamplePoint};
use crate::source::{ByteSource, Connector, SourceError};

use super::cancel::CancelToken;
use super::session::{LoopExit, run_decode_loop};
use super::sink::SampleSink;
use super::stats::{FrameCounters, FrameStats};
use super::store::TimeSeriesStore;

const WORKER_THREAD_NAME: &str = "mindwave-acquisition";

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("acquisition is already running")]
    AlreadyRunning,
    #[error("acquisition is not running")]
    NotRunning,
    #[error("failed to open byte source: {0}")]
    Open(#[from] SourceError),
    #[error("byte source lost during acquisition: {0}")]
    SourceLost(#[source] SourceError),
    #[error("failed to spawn acquisition thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("acquisition thread panicked")]
    WorkerPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Running,
}

struct Worker {
    cancel: CancelToken,
    handle: JoinHandle<Result<FrameCounters, SourceError>>,
}

impl Worker {
    fn join(self) -> Result<FrameCounters, AcquisitionError> {
        match self.handle.join() {
            Ok(Ok(counters)) => Ok(counters),
            Ok(Err(err)) => Err(AcquisitionError::SourceLost(err)),
            Err(_) => Err(AcquisitionError::WorkerPanicked),
        }
    }
}

/// Owns the background decode loop for one device.
///
/// `start()` opens a fresh byte source through the connector and spawns the
/// loop; `stop()` cancels it, waits for it to exit and returns the run's
/// counters. The controller can be restarted any number of times. Each run
/// begins from a fresh sync search, so nothing read before a stop carries
/// over.
///
/// History accumulates across runs until [`reset`](Self::reset) is called.
/// Counters are per run.
///
/// # Examples
/// ```no_run
/// use mindwave_core::{AcquisitionController, Metric, SerialConnector};
///
/// let mut controller = AcquisitionController::new(SerialConnector::new("/dev/rfcomm0"));
/// controller.register(Metric::Attention, |reading| println!("{reading:?}"));
/// controller.start()?;
/// std::thread::sleep(std::time::Duration::from_secs(10));
/// let counters = controller.stop()?;
/// println!("{} frames", counters.frames_decoded);
/// # Ok::<(), mindwave_core::AcquisitionError>(())
/// ```
pub struct AcquisitionController<C: Connector> {
    connector: C,
    sink: Arc<SampleSink>,
    stats: Arc<FrameStats>,
    worker: Option<Worker>,
}

impl<C: Connector> AcquisitionController<C> {
    pub fn new(connector: C) -> Self {
        Self::with_sink(connector, Arc::new(SampleSink::new()))
    }

    /// Use an existing sink, e.g. one shared with other readers.
    pub fn with_sink(connector: C, sink: Arc<SampleSink>) -> Self {
        Self {
            connector,
            sink,
            stats: Arc::new(FrameStats::new()),
            worker: None,
        }
    }

    /// Open the byte source and launch the decode loop.
    ///
    /// A previous run that ended on its own (source lost) is reaped first and
    /// its failure logged.
    pub fn start(&mut self) -> Result<(), AcquisitionError> {
        if let Some(worker) = self.worker.take() {
            if !worker.handle.is_finished() {
                self.worker = Some(worker);
                return Err(AcquisitionError::AlreadyRunning);
            }
            if let Err(err) = worker.join() {
                warn!(error = %err, "previous acquisition run ended abnormally");
            }
        }

        let endpoint = self.connector.describe();
        let source = self.connector.open()?;
        let stats = Arc::new(FrameStats::new());
        let cancel = CancelToken::new();

        let worker_sink = Arc::clone(&self.sink);
        let worker_stats = Arc::clone(&stats);
        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(source, &worker_sink, &worker_stats, &worker_cancel))
            .map_err(AcquisitionError::Spawn)?;

        info!(%endpoint, "acquisition started");
        self.stats = stats;
        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Cancel the decode loop, wait for it to exit and return its counters.
    ///
    /// Returns `SourceLost` when the run had already ended because the byte
    /// source failed, and `NotRunning` when there is no run to stop.
    pub fn stop(&mut self) -> Result<FrameCounters, AcquisitionError> {
        let worker = self.worker.take().ok_or(AcquisitionError::NotRunning)?;
        worker.cancel.cancel();
        let outcome = worker.join();
        if let Ok(counters) = &outcome {
            info!(
                frames = counters.frames_decoded,
                discarded = counters.discarded(),
                "acquisition stopped"
            );
        }
        outcome
    }

    pub fn state(&self) -> AcquisitionState {
        match &self.worker {
            Some(worker) if !worker.handle.is_finished() => AcquisitionState::Running,
            _ => AcquisitionState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == AcquisitionState::Running
    }

    /// See [`SampleSink::register`].
    pub fn register<F>(&self, metric: Metric, callback: F) -> bool
    where
        F: FnMut(Reading) + Send + 'static,
    {
        self.sink.register(metric, callback)
    }

    pub fn unregister(&self, metric: Metric) -> bool {
        self.sink.unregister(metric)
    }

    pub fn subscribe(&self, capacity: usize) -> Receiver<DecodedSample> {
        self.sink.subscribe(capacity)
    }

    pub fn history(&self, metric: Metric) -> Vec<SamplePoint> {
        self.sink.history(metric)
    }

    pub fn latest(&self, metric: Metric) -> Option<SamplePoint> {
        self.sink.latest(metric)
    }

    pub fn snapshot(&self) -> TimeSeriesStore {
        self.sink.snapshot()
    }

    pub fn reset(&self) {
        self.sink.reset();
    }

    /// Counters of the current run, or of the last one once stopped.
    pub fn counters(&self) -> FrameCounters {
        self.stats.snapshot()
    }

    pub fn sink(&self) -> &Arc<SampleSink> {
        &self.sink
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: Connector> Drop for AcquisitionController<C> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.cancel();
            if let Err(err) = worker.join() {
                warn!(error = %err, "acquisition ended abnormally");
            }
        }
    }
}

fn run_worker<S: ByteSource>(
    mut source: S,
    sink: &SampleSink,
    stats: &FrameStats,
    cancel: &CancelToken,
) -> Result<FrameCounters, SourceError> {
    let _feeds = sink.feeds_guard();
    let exit = run_decode_loop(&mut source, sink, stats, cancel);
    if let Err(err) = source.close() {
        warn!(error = %err, "failed to close byte source");
    }

    match exit {
        LoopExit::Cancelled => Ok(stats.snapshot()),
        LoopExit::SourceEnded(err) => {
            warn!(error = %err, "byte source lost, acquisition ended");
            Err(err)
        }
    }
}
