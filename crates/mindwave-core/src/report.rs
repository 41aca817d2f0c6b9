use std::fs::File;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::acquisition::{FrameCounters, SampleSink, TimeSeriesStore, decode_source};
use crate::sample::SamplePoint;
use crate::source::{ReaderSource, SourceError};
use crate::{DEFAULT_GENERATED_AT, MetricSummary, SessionReport, make_stub_report};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode a recorded ThinkGear byte dump into a session report.
pub fn decode_file(path: &Path) -> Result<SessionReport, DecodeError> {
    let file = File::open(path)?;
    let bytes = file.metadata()?.len();
    let sink = SampleSink::new();
    let counters = decode_source(ReaderSource::new(file), &sink)?;
    Ok(build_report(
        &path.display().to_string(),
        Some(bytes),
        counters,
        &sink.snapshot(),
    ))
}

/// Summarize a run's counters and recorded history.
///
/// `generated_at` is the latest sample time in the store, or
/// [`DEFAULT_GENERATED_AT`] when nothing was recorded, so decoding the same
/// input twice yields identical reports apart from capture clocks.
pub fn build_report(
    source: &str,
    bytes: Option<u64>,
    counters: FrameCounters,
    store: &TimeSeriesStore,
) -> SessionReport {
    let mut report = make_stub_report(source, bytes);
    report.frames = counters;
    report.metrics = store
        .metrics()
        .filter_map(|metric| summarize(metric.as_str(), store.history(metric)))
        .collect();

    let last_seen = store
        .metrics()
        .filter_map(|metric| store.latest(metric))
        .map(|point| point.captured_at)
        .max();
    report.generated_at = last_seen
        .and_then(format_timestamp)
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report
}

fn summarize(name: &str, points: &[SamplePoint]) -> Option<MetricSummary> {
    let first = points.first()?;
    let last = points.last()?;
    let mut min = first.value;
    let mut max = first.value;
    let mut sum = 0i64;
    for point in points {
        min = min.min(point.value);
        max = max.max(point.value);
        sum += i64::from(point.value);
    }

    Some(MetricSummary {
        metric: name.to_string(),
        samples: points.len() as u64,
        min,
        max,
        mean: sum as f64 / points.len() as f64,
        last: last.value,
        first_at: format_timestamp(first.captured_at),
        last_at: format_timestamp(last.captured_at),
    })
}

fn format_timestamp(ts: OffsetDateTime) -> Option<String> {
    ts.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use time::{Duration, OffsetDateTime};

    use super::{build_report, decode_file};
    use crate::acquisition::{FrameCounters, TimeSeriesStore};
    use crate::protocols::thinkgear::encode_frame;
    use crate::sample::Metric;
    use crate::{DEFAULT_GENERATED_AT, REPORT_VERSION};

    #[test]
    fn empty_store_uses_default_timestamp() {
        let report = build_report("dump.bin", Some(0), FrameCounters::default(), &TimeSeriesStore::new());
        assert_eq!(report.generated_at, DEFAULT_GENERATED_AT);
        assert!(report.metrics.is_empty());
        assert_eq!(report.report_version, REPORT_VERSION);
    }

    #[test]
    fn summaries_follow_canonical_metric_order() {
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let t1 = t0 + Duration::seconds(1);
        let mut store = TimeSeriesStore::new();
        store.record(Metric::Meditation, t0, 10);
        store.record(Metric::Attention, t0, 40);
        store.record(Metric::Attention, t1, 60);

        let report = build_report("dump.bin", None, FrameCounters::default(), &store);
        let names: Vec<_> = report.metrics.iter().map(|m| m.metric.as_str()).collect();
        assert_eq!(names, vec!["attention", "meditation"]);

        let attention = &report.metrics[0];
        assert_eq!(attention.samples, 2);
        assert_eq!((attention.min, attention.max, attention.last), (40, 60, 60));
        assert!((attention.mean - 50.0).abs() < f64::EPSILON);
        assert_eq!(attention.first_at.as_deref(), Some("1970-01-01T00:00:00Z"));
        assert_eq!(report.generated_at, "1970-01-01T00:00:01Z");
    }

    #[test]
    fn decode_file_reports_counters_and_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = vec![0x00, 0x13];
        bytes.extend(encode_frame(&[0x04, 0x32, 0x05, 0x0A]).unwrap());
        file.write_all(&bytes).unwrap();

        let report = decode_file(file.path()).unwrap();
        assert_eq!(report.input.bytes, Some(bytes.len() as u64));
        assert_eq!(report.frames.frames_decoded, 1);
        assert_eq!(report.frames.bytes_skipped, 2);
        assert_eq!(report.metrics.len(), 2);
    }
}
