//! Analyses over stored wind data.
//!
//! Glue between a [`WindDataSource`](crate::storage::WindDataSource) and the
//! processing engines: interval selection by average wind, autocorrelation
//! reports with fitted decay lines, the per-direction scan, averaged spectra,
//! the speed-over-time graph, histograms and date parsing for the CLI.

mod autocorrelation;
mod dates;
mod histogram;
mod intervals;
mod speed_graph;
mod spectrum;

pub use autocorrelation::{analyze_autocorrelation, scan_directions, AutocorrelationReport, DirectionScan};
pub use dates::{parse_datetime, parse_range};
pub use histogram::{bucket_histogram, histogram_buckets, summarize, value_histogram, SignalSummary};
pub use intervals::{gather_intervals, load_intervals, select_intervals, FilterBounds, WindFilter};
pub use speed_graph::speed_graph;
pub use spectrum::{analyze_spectrum, FrequencyRange, SpectrumReport};
