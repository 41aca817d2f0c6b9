//! Decoded sample model.
//!
//! A `Metric` names one biosignal quantity; a `Reading` is one decoded value
//! tagged with its metric and carrying the metric's native width. Every
//! validated frame becomes one immutable `DecodedSample`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use time::OffsetDateTime;

/// Closed set of metrics carried by the ThinkGear stream.
///
/// Declaration order is the canonical order used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    PoorSignal,
    Attention,
    Meditation,
    BlinkStrength,
    RawValue,
    Delta,
    Theta,
    LowAlpha,
    HighAlpha,
    LowBeta,
    HighBeta,
    LowGamma,
    MidGamma,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::PoorSignal,
        Metric::Attention,
        Metric::Meditation,
        Metric::BlinkStrength,
        Metric::RawValue,
        Metric::Delta,
        Metric::Theta,
        Metric::LowAlpha,
        Metric::HighAlpha,
        Metric::LowBeta,
        Metric::HighBeta,
        Metric::LowGamma,
        Metric::MidGamma,
    ];

    /// EEG power bands in wire order.
    pub const EEG_BANDS: [Metric; 8] = [
        Metric::Delta,
        Metric::Theta,
        Metric::LowAlpha,
        Metric::HighAlpha,
        Metric::LowBeta,
        Metric::HighBeta,
        Metric::LowGamma,
        Metric::MidGamma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::PoorSignal => "poorSignal",
            Metric::Attention => "attention",
            Metric::Meditation => "meditation",
            Metric::BlinkStrength => "blinkStrength",
            Metric::RawValue => "rawValue",
            Metric::Delta => "delta",
            Metric::Theta => "theta",
            Metric::LowAlpha => "lowAlpha",
            Metric::HighAlpha => "highAlpha",
            Metric::LowBeta => "lowBeta",
            Metric::HighBeta => "highBeta",
            Metric::LowGamma => "lowGamma",
            Metric::MidGamma => "midGamma",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric '{0}'")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    /// Accepts the canonical camelCase name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// One decoded value, typed by its metric.
///
/// EEG band variants hold unsigned 24-bit powers, as carried on the wire.
/// Only the low 24 bits of a band value are meaningful; [`Reading::value`]
/// ignores the upper byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    PoorSignal(u8),
    Attention(u8),
    Meditation(u8),
    BlinkStrength(u8),
    RawValue(i16),
    Delta(u32),
    Theta(u32),
    LowAlpha(u32),
    HighAlpha(u32),
    LowBeta(u32),
    HighBeta(u32),
    LowGamma(u32),
    MidGamma(u32),
}

impl Reading {
    /// Build the reading for an EEG band metric. Non-band metrics yield `None`.
    pub fn eeg_band(metric: Metric, value: u32) -> Option<Reading> {
        let reading = match metric {
            Metric::Delta => Reading::Delta(value),
            Metric::Theta => Reading::Theta(value),
            Metric::LowAlpha => Reading::LowAlpha(value),
            Metric::HighAlpha => Reading::HighAlpha(value),
            Metric::LowBeta => Reading::LowBeta(value),
            Metric::HighBeta => Reading::HighBeta(value),
            Metric::LowGamma => Reading::LowGamma(value),
            Metric::MidGamma => Reading::MidGamma(value),
            _ => return None,
        };
        Some(reading)
    }

    pub fn metric(&self) -> Metric {
        match self {
            Reading::PoorSignal(_) => Metric::PoorSignal,
            Reading::Attention(_) => Metric::Attention,
            Reading::Meditation(_) => Metric::Meditation,
            Reading::BlinkStrength(_) => Metric::BlinkStrength,
            Reading::RawValue(_) => Metric::RawValue,
            Reading::Delta(_) => Metric::Delta,
            Reading::Theta(_) => Metric::Theta,
            Reading::LowAlpha(_) => Metric::LowAlpha,
            Reading::HighAlpha(_) => Metric::HighAlpha,
            Reading::LowBeta(_) => Metric::LowBeta,
            Reading::HighBeta(_) => Metric::HighBeta,
            Reading::LowGamma(_) => Metric::LowGamma,
            Reading::MidGamma(_) => Metric::MidGamma,
        }
    }

    /// Value widened to a common integer type.
    ///
    /// Band values are read as 24-bit, so anything above `0xFF_FFFF` in a
    /// hand-built band reading is dropped rather than wrapped negative.
    pub fn value(&self) -> i32 {
        match *self {
            Reading::PoorSignal(v)
            | Reading::Attention(v)
            | Reading::Meditation(v)
            | Reading::BlinkStrength(v) => i32::from(v),
            Reading::RawValue(v) => i32::from(v),
            Reading::Delta(v)
            | Reading::Theta(v)
            | Reading::LowAlpha(v)
            | Reading::HighAlpha(v)
            | Reading::LowBeta(v)
            | Reading::HighBeta(v)
            | Reading::LowGamma(v)
            | Reading::MidGamma(v) => (v & 0x00FF_FFFF) as i32,
        }
    }
}

/// Readings decoded from one frame, stamped with the capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSample {
    captured_at: OffsetDateTime,
    readings: Vec<Reading>,
}

impl DecodedSample {
    /// At most one reading per metric is kept; a later reading of the same
    /// metric replaces the earlier one.
    pub fn new(captured_at: OffsetDateTime, readings: Vec<Reading>) -> Self {
        let mut kept: Vec<Reading> = Vec::with_capacity(readings.len());
        for reading in readings {
            match kept.iter_mut().find(|r| r.metric() == reading.metric()) {
                Some(existing) => *existing = reading,
                None => kept.push(reading),
            }
        }
        Self {
            captured_at,
            readings: kept,
        }
    }

    pub fn captured_at(&self) -> OffsetDateTime {
        self.captured_at
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn get(&self, metric: Metric) -> Option<Reading> {
        self.readings.iter().copied().find(|r| r.metric() == metric)
    }

    pub fn value(&self, metric: Metric) -> Option<i32> {
        self.get(metric).map(|r| r.value())
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// One recorded point of a metric's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePoint {
    pub captured_at: OffsetDateTime,
    pub value: i32,
}
