//! wind-analyzer - command line front end
//!
//! Imports anemometer records into a sled database and prints analyses as
//! JSON.
//!
//! # Usage
//!
//! ```bash
//! # Import a CSV export (timestamp_ms,direction,speed_tenths[,gusts_tenths])
//! wind-analyzer import --csv wind.csv
//!
//! # Speed autocorrelation for a day, only 30-minute windows with 10-15 kn
//! wind-analyzer autocorrelation --from 2020-06-01 --to 2020-06-02 \
//!     --speed-from 10 --speed-to 15
//!
//! # Average speed over a week, 100 points
//! wind-analyzer speed-graph --from 2020-06-01 --to 2020-06-08
//!
//! # Analyse a CSV file directly, without importing it
//! wind-analyzer --input wind.csv spectrum --from 2020-06-01 --to 2020-06-02
//! ```
//!
//! # Environment Variables
//!
//! - `WIND_ANALYZER_CONFIG`: Path to the analyzer config TOML
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use wind_analyzer::analysis::{
    analyze_autocorrelation, analyze_spectrum, bucket_histogram, gather_intervals,
    histogram_buckets, parse_range, scan_directions, select_intervals, speed_graph, summarize,
    value_histogram, FilterBounds, SignalSummary, WindFilter,
};
use wind_analyzer::config::{self, defaults, AnalyzerConfig};
use wind_analyzer::storage::{load_csv, MemoryWindSource, SledWindStore, WindDataSource};
use wind_analyzer::types::{format_millis, Signal};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wind-analyzer")]
#[command(about = "Autocorrelation, fit and spectrum analysis of wind sensor data")]
#[command(version)]
struct CliArgs {
    /// Analyzer config TOML (overrides WIND_ANALYZER_CONFIG and ./analyzer_config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sled database directory (default: storage.path from the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Read records from this CSV file instead of the database
    #[arg(long, global = true, conflicts_with = "db")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

/// Time range shared by the analysis commands.
#[derive(clap::Args, Debug)]
struct RangeArgs {
    /// Start (YYYY-MM-DD, YYYY-MM-DD HH:MM[:SS] or RFC 3339, UTC)
    #[arg(long)]
    from: String,
    /// End, same formats as --from
    #[arg(long)]
    to: String,
}

/// Optional average speed/direction filter.
#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Lower average speed bound (knots, inclusive)
    #[arg(long)]
    speed_from: Option<f64>,
    /// Upper average speed bound (knots, exclusive)
    #[arg(long)]
    speed_to: Option<f64>,
    /// Lower average direction bound (degrees, inclusive)
    #[arg(long)]
    direction_from: Option<f64>,
    /// Upper average direction bound (degrees, exclusive)
    #[arg(long)]
    direction_to: Option<f64>,
}

impl From<&FilterArgs> for WindFilter {
    fn from(args: &FilterArgs) -> Self {
        Self {
            speed_from: args.speed_from,
            speed_to: args.speed_to,
            direction_from: args.direction_from,
            direction_to: args.direction_to,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Import wind records from a CSV file into the database
    Import {
        #[arg(long)]
        csv: PathBuf,
        /// Remove all stored records first
        #[arg(long)]
        clear: bool,
    },

    /// Autocorrelation curve with bi-exponential fit
    Autocorrelation {
        #[arg(long, default_value = "speed")]
        signal: Signal,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Speed autocorrelation fit parameters per 20 degree direction sector
    ScanDirection {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        speed_from: Option<f64>,
        #[arg(long)]
        speed_to: Option<f64>,
    },

    /// Averaged wind speed amplitude spectrum
    Spectrum {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Average wind speed over time, one point per equal step of the range
    SpeedGraph {
        #[command(flatten)]
        range: RangeArgs,
        /// Number of averaged steps
        #[arg(long, default_value_t = defaults::SPEED_GRAPH_STEPS)]
        steps: usize,
    },

    /// Histogram of stored speed or direction values
    Histogram {
        #[arg(long, default_value = "speed")]
        signal: Signal,
        #[command(flatten)]
        range: RangeArgs,
        /// Print every stored value instead of display buckets
        #[arg(long)]
        raw: bool,
    },

    /// Time ranges whose average speed lies in the given bounds
    FindTimes {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        speed_from: f64,
        #[arg(long)]
        speed_to: f64,
    },

    /// Record count, time span and summary statistics
    Info,

    /// Print the effective configuration as TOML
    ShowConfig,
}

// ============================================================================
// Output Types
// ============================================================================

#[derive(Serialize)]
struct TimeRangeOutput {
    start: String,
    end: String,
    start_ms: i64,
    end_ms: i64,
}

#[derive(Serialize)]
struct SpeedPointOutput {
    time: String,
    time_ms: i64,
    speed: f64,
}

#[derive(Serialize)]
struct InfoOutput {
    count: usize,
    first: Option<String>,
    last: Option<String>,
    speed: Option<SignalSummary>,
    direction: Option<SignalSummary>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{text}");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let analyzer_config = match &args.config {
        Some(path) => AnalyzerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyzerConfig::load(),
    };
    config::init(analyzer_config);
    let cfg = config::get();

    match &args.command {
        SubCommand::Import { csv, clear } => {
            let store = open_store(&args, cfg)?;
            run_import(&store, csv, *clear)
        }
        SubCommand::ShowConfig => {
            println!("{}", cfg.to_toml()?);
            Ok(())
        }
        command => {
            let source = open_source(&args, cfg)?;
            run_analysis(source.as_ref(), command, cfg)
        }
    }
}

fn open_store(args: &CliArgs, cfg: &AnalyzerConfig) -> Result<SledWindStore> {
    let path = args
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.storage.path));
    SledWindStore::open(&path)
        .with_context(|| format!("Failed to open wind database at {}", path.display()))
}

fn open_source(args: &CliArgs, cfg: &AnalyzerConfig) -> Result<Box<dyn WindDataSource>> {
    match &args.input {
        Some(csv) => {
            let import = load_csv(csv)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            Ok(Box::new(MemoryWindSource::new(import.records)))
        }
        None => Ok(Box::new(open_store(args, cfg)?)),
    }
}

fn run_import(store: &SledWindStore, csv: &Path, clear: bool) -> Result<()> {
    if clear {
        store.clear().context("Failed to clear database")?;
        info!("Cleared stored wind records");
    }
    let import = load_csv(csv).with_context(|| format!("Failed to read {}", csv.display()))?;
    if import.rejected > 0 {
        warn!(rejected = import.rejected, "Some CSV lines were rejected");
    }
    let stored = store
        .insert_batch(&import.records)
        .context("Failed to store wind records")?;
    info!(stored, total = store.len(), "Import complete");
    print_json(&store.stats()?)
}

fn run_analysis(source: &dyn WindDataSource, command: &SubCommand, cfg: &AnalyzerConfig) -> Result<()> {
    match command {
        SubCommand::Autocorrelation {
            signal,
            range,
            filter,
        } => {
            let range = parse_range(&range.from, &range.to)?;
            let intervals = gather_intervals(
                source,
                &range,
                &WindFilter::from(filter),
                *signal,
                cfg.autocorrelation.average_interval_millis,
                &cfg.selection,
            )?;
            if intervals.is_empty() {
                warn!("No interval matches the filter");
            }
            print_json(&analyze_autocorrelation(&intervals, *signal, cfg)?)
        }
        SubCommand::ScanDirection {
            range,
            speed_from,
            speed_to,
        } => {
            let range = parse_range(&range.from, &range.to)?;
            print_json(&scan_directions(source, &range, *speed_from, *speed_to, cfg)?)
        }
        SubCommand::Spectrum { range, filter } => {
            let range = parse_range(&range.from, &range.to)?;
            let filter = WindFilter::from(filter);
            let intervals = gather_intervals(
                source,
                &range,
                &filter,
                Signal::Speed,
                cfg.spectrum.average_interval_millis,
                &cfg.selection,
            )?;
            print_json(&analyze_spectrum(&intervals, &filter, cfg)?)
        }
        SubCommand::SpeedGraph { range, steps } => {
            let range = parse_range(&range.from, &range.to)?;
            let curve = speed_graph(source, &range, *steps)?;
            let output: Vec<SpeedPointOutput> = curve
                .points()
                .map(|(time, speed)| SpeedPointOutput {
                    time: format_millis(time as i64),
                    time_ms: time as i64,
                    speed,
                })
                .collect();
            print_json(&output)
        }
        SubCommand::Histogram { signal, range, raw } => {
            let range = parse_range(&range.from, &range.to)?;
            let histogram = value_histogram(source, *signal, &range)?;
            if *raw {
                return print_json(&histogram);
            }
            let (bucket_size, zero_bucket) = histogram_buckets(*signal);
            print_json(&bucket_histogram(&histogram, bucket_size, zero_bucket)?)
        }
        SubCommand::FindTimes {
            range,
            speed_from,
            speed_to,
        } => {
            let range = parse_range(&range.from, &range.to)?;
            let bounds = FilterBounds {
                speed_from: *speed_from,
                speed_to: *speed_to,
                direction_from: cfg.selection.direction_from,
                direction_to: cfg.selection.direction_to,
            };
            let found = select_intervals(
                source,
                &range,
                &bounds,
                cfg.selection.find_step_millis,
                true,
                cfg.selection.max_intervals,
            )?;
            let output: Vec<TimeRangeOutput> = found
                .iter()
                .map(|interval| TimeRangeOutput {
                    start: format_millis(interval.start()),
                    end: format_millis(interval.end()),
                    start_ms: interval.start(),
                    end_ms: interval.end(),
                })
                .collect();
            print_json(&output)
        }
        SubCommand::Info => run_info(source),
        SubCommand::Import { .. } | SubCommand::ShowConfig => Ok(()),
    }
}

fn run_info(source: &dyn WindDataSource) -> Result<()> {
    let Some((first, last)) = source.time_bounds()? else {
        return print_json(&InfoOutput {
            count: 0,
            first: None,
            last: None,
            speed: None,
            direction: None,
        });
    };

    // Summaries cover (start, end], so start one millisecond early
    let range = wind_analyzer::Interval::new(first.saturating_sub(1), last)?;
    print_json(&InfoOutput {
        count: source.count(first, last.saturating_add(1))?,
        first: Some(format_millis(first)),
        last: Some(format_millis(last)),
        speed: summarize(source, Signal::Speed, &range)?,
        direction: summarize(source, Signal::Direction, &range)?,
    })
}
