//! Wind readings as stored by the data source, and the signal selectors
//! that turn them into analysable samples.

use serde::{Deserialize, Serialize};

use super::Sample;
use crate::config::defaults::SPEED_KNOTS_PER_UNIT;

// ============================================================================
// Stored Reading
// ============================================================================

/// A single anemometer reading.
///
/// Speeds are kept in the sensor's native unit of 1/10 knot so that
/// histograms can group by the exact stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindRecord {
    /// Measuring time (Unix epoch milliseconds)
    pub time_ms: i64,
    /// Direction the wind comes from (degrees)
    pub direction_deg: i32,
    /// Wind speed in 1/10 knots
    pub speed_tenths: i32,
    /// Gust speed within the measuring interval in 1/10 knots
    #[serde(default)]
    pub gusts_tenths: i32,
    /// Whether the sensor already averaged this reading
    #[serde(default)]
    pub averaged: bool,
}

impl WindRecord {
    pub fn new(time_ms: i64, direction_deg: i32, speed_tenths: i32) -> Self {
        Self {
            time_ms,
            direction_deg,
            speed_tenths,
            gusts_tenths: speed_tenths,
            averaged: false,
        }
    }

    /// Wind speed in knots.
    pub fn speed_knots(&self) -> f64 {
        f64::from(self.speed_tenths) * SPEED_KNOTS_PER_UNIT
    }
}

// ============================================================================
// Signal Selection
// ============================================================================

/// Which quantity of a [`WindRecord`] is being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Speed,
    Direction,
}

impl Signal {
    /// The distance semantics used when correlating this signal.
    pub fn kind(self) -> SignalKind {
        match self {
            Signal::Speed => SignalKind::Linear,
            Signal::Direction => SignalKind::Circular,
        }
    }

    /// Analysable value of a record (knots or degrees).
    pub fn value(self, record: &WindRecord) -> f64 {
        match self {
            Signal::Speed => record.speed_knots(),
            Signal::Direction => f64::from(record.direction_deg),
        }
    }

    /// Raw stored value, used as the histogram grouping key.
    pub fn raw_value(self, record: &WindRecord) -> i32 {
        match self {
            Signal::Speed => record.speed_tenths,
            Signal::Direction => record.direction_deg,
        }
    }

    /// Convert a raw stored value into the analysable unit.
    pub fn scale_raw(self, raw: f64) -> f64 {
        match self {
            Signal::Speed => raw * SPEED_KNOTS_PER_UNIT,
            Signal::Direction => raw,
        }
    }

    pub fn sample(self, record: &WindRecord) -> Sample {
        Sample {
            timestamp: record.time_ms,
            value: self.value(record),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Speed => write!(f, "speed"),
            Signal::Direction => write!(f, "direction"),
        }
    }
}

impl std::str::FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speed" => Ok(Signal::Speed),
            "direction" => Ok(Signal::Direction),
            other => Err(format!("unknown signal '{other}' (expected speed or direction)")),
        }
    }
}

/// Distance semantics of a signal.
///
/// `Linear` values are magnitudes (speed); `Circular` values are compass
/// degrees where 359° and 1° are 2° apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Linear,
    Circular,
}

/// One histogram bin: a stored value and how often it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: f64,
    pub count: u64,
}
