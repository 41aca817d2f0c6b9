use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::sample::{DecodedSample, Metric, SamplePoint};

/// Per-metric, insertion-ordered history of decoded values.
///
/// Points are appended in stream order, so each series is chronological.
/// Two points may share a timestamp; both are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesStore {
    series: BTreeMap<Metric, Vec<SamplePoint>>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, metric: Metric, captured_at: OffsetDateTime, value: i32) {
        self.series
            .entry(metric)
            .or_default()
            .push(SamplePoint { captured_at, value });
    }

    pub fn record_sample(&mut self, sample: &DecodedSample) {
        for reading in sample.readings() {
            self.record(reading.metric(), sample.captured_at(), reading.value());
        }
    }

    pub fn history(&self, metric: Metric) -> &[SamplePoint] {
        self.series.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, metric: Metric) -> Option<SamplePoint> {
        self.series.get(&metric).and_then(|points| points.last().copied())
    }

    /// Metrics with at least one point, in canonical order.
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.series
            .iter()
            .filter(|(_, points)| !points.is_empty())
            .map(|(metric, _)| *metric)
    }

    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }
}
