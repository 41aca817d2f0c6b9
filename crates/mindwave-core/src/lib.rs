//! MindWave core library: ThinkGear stream decoding and live acquisition.
//!
//! Byte sources feed a frame scanner, which hands candidate frames to the
//! protocol layer (layout/reader/parser) for checksum validation and payload
//! decoding. Decoded samples go to a sink that dispatches per-metric
//! callbacks, records per-metric history and fans samples out to
//! subscribers. Decoding is byte-oriented and side-effect free; all I/O is
//! isolated in `source`.
//!
//! Invariants:
//! - Only frames whose checksum matches are decoded.
//! - Per-frame problems are counted and skipped, never fatal.
//! - History is append-only and chronological per metric.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use mindwave_core::decode_file;
//!
//! let report = decode_file(Path::new("session.bin"))?;
//! println!("frames decoded: {}", report.frames.frames_decoded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod acquisition;
pub mod protocols;
mod report;
mod sample;
mod source;

pub use acquisition::{
    AcquisitionController, AcquisitionError, AcquisitionState, CallbackRegistry, CancelToken,
    FrameCounters, FrameStats, SampleSink, TimeSeriesStore, decode_source, decode_source_until,
};
pub use report::{DecodeError, build_report, decode_file};
pub use sample::{DecodedSample, Metric, Reading, SamplePoint, UnknownMetric};
pub use source::{
    ByteSource, Connector, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT, ReaderSource,
    SerialConnector, SourceError,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no sample was recorded.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Summary of one decoding session, offline or live.
///
/// # Examples
/// ```
/// use mindwave_core::make_stub_report;
///
/// let report = make_stub_report("session.bin", Some(123));
/// assert_eq!(report.report_version, mindwave_core::REPORT_VERSION);
/// assert!(report.metrics.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the last recorded sample.
    pub generated_at: String,
    /// Where the bytes came from.
    pub input: InputInfo,
    /// Frame counters for the run.
    pub frames: FrameCounters,
    /// Per-metric summaries in canonical metric order.
    pub metrics: Vec<MetricSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "mindwave").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input metadata embedded in reports.
///
/// # Examples
/// ```
/// use mindwave_core::InputInfo;
///
/// let input = InputInfo {
///     source: "/dev/rfcomm0@57600".to_string(),
///     bytes: None,
/// };
/// assert!(input.bytes.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// File path or serial endpoint as provided by the caller.
    pub source: String,
    /// Input size in bytes, known for recorded dumps only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Aggregates over one metric's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Canonical metric name (e.g., "attention", "lowAlpha").
    pub metric: String,
    /// Number of recorded points.
    pub samples: u64,
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    /// Most recent value.
    pub last: i32,
    /// RFC3339 timestamp of the first point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_at: Option<String>,
    /// RFC3339 timestamp of the last point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_at: Option<String>,
}

/// Build a stub report with base fields filled and no metrics.
pub fn make_stub_report(source: &str, bytes: Option<u64>) -> SessionReport {
    SessionReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "mindwave".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            source: source.to_string(),
            bytes,
        },
        frames: FrameCounters::default(),
        metrics: vec![],
    }
}
