//! Shared data structures for wind time-series analysis
//!
//! This module defines the values that flow between the data source and
//! the analysis engines:
//! - `WindRecord`: one stored anemometer reading
//! - `Sample` / `Interval` / `IntervalWithSamples`: the time-series model
//! - `ChartCurve`: `(x[], y[])` pairs handed to the display layer

mod series;
mod wind;

pub use series::*;
pub use wind::*;
