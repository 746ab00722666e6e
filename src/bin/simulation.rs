//! Wind Sensor Simulation
//!
//! Generates irregularly sampled anemometer data for testing wind-analyzer.
//! The wind is modelled as two mean-reverting random processes:
//! - Speed: slow weather trend plus fast gusts that decay within seconds
//! - Direction: slowly veering mean with short-term oscillation
//!
//! # Usage
//! ```bash
//! ./wind-simulation --hours 6 --seed 7 > wind.csv
//! ./wind-analyzer import --csv wind.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::io::{self, BufWriter, Write};

use wind_analyzer::analysis::parse_datetime;
use wind_analyzer::types::{format_millis, WindRecord};

// ============================================================================
// Wind Constants
// ============================================================================

/// Gust decay time (seconds)
const GUST_TIME_CONSTANT: f64 = 20.0;
/// Weather trend decay time (seconds)
const TREND_TIME_CONSTANT: f64 = 1_800.0;
/// Direction oscillation decay time (seconds)
const DIRECTION_TIME_CONSTANT: f64 = 60.0;
/// Gust strength relative to the mean speed
const GUST_INTENSITY: f64 = 0.15;
/// Probability of a missing reading (sensor dropout)
const DROPOUT_PROBABILITY: f64 = 0.01;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wind-simulation")]
#[command(about = "Synthetic anemometer data for wind-analyzer testing")]
#[command(version = "1.0")]
struct Args {
    /// Simulation duration in hours (1-168)
    #[arg(short = 'H', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=168))]
    hours: u32,

    /// Start time of the first reading (UTC)
    #[arg(long, default_value = "2020-06-01")]
    start: String,

    /// Mean wind speed in knots
    #[arg(long, default_value = "12.0")]
    mean_speed: f64,

    /// Mean wind direction in degrees
    #[arg(long, default_value = "240.0")]
    mean_direction: f64,

    /// Nominal sampling interval in milliseconds
    #[arg(long, default_value = "1000")]
    interval_ms: u32,

    /// Standard deviation of the sampling jitter in milliseconds
    #[arg(long, default_value = "150")]
    jitter_ms: u32,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the summary on stderr
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Weather Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Steady breeze (0-30%)
    Steady,
    /// Front passing, wind builds and veers (30-60%)
    Front,
    /// Gusty post-frontal wind (60-85%)
    Gusty,
    /// Dying down (85-100%)
    Easing,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Steady => "Steady breeze",
            Phase::Front => "Front passage (building, veering)",
            Phase::Gusty => "Gusty post-frontal wind",
            Phase::Easing => "Easing",
        }
    }

    fn from_progress(progress: f64) -> Self {
        match progress {
            p if p < 0.30 => Phase::Steady,
            p if p < 0.60 => Phase::Front,
            p if p < 0.85 => Phase::Gusty,
            _ => Phase::Easing,
        }
    }

    /// `(speed factor, direction offset in degrees, gust factor)`
    fn targets(self) -> (f64, f64, f64) {
        match self {
            Phase::Steady => (1.0, 0.0, 1.0),
            Phase::Front => (1.4, 40.0, 1.5),
            Phase::Gusty => (1.2, 60.0, 2.5),
            Phase::Easing => (0.6, 50.0, 0.8),
        }
    }
}

// ============================================================================
// Simulation State
// ============================================================================

struct WindSimulation {
    rng: StdRng,
    unit_noise: Normal<f64>,
    mean_speed: f64,
    mean_direction: f64,
    trend: f64,
    gust: f64,
    direction_mean: f64,
    direction_swing: f64,
}

impl WindSimulation {
    fn new(mean_speed: f64, mean_direction: f64, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            unit_noise: Normal::new(0.0, 1.0).context("Invalid noise distribution")?,
            mean_speed,
            mean_direction,
            trend: mean_speed,
            gust: 0.0,
            direction_mean: mean_direction,
            direction_swing: 0.0,
        })
    }

    /// Exact Ornstein-Uhlenbeck step towards `target`.
    fn ou_step(&mut self, value: f64, target: f64, tau: f64, sigma: f64, dt: f64) -> f64 {
        let decay = (-dt / tau).exp();
        let spread = sigma * (1.0 - decay * decay).sqrt();
        target + (value - target) * decay + spread * self.unit_noise.sample(&mut self.rng)
    }

    /// Advance by `dt` seconds and return `(speed kn, direction deg, gust kn)`.
    fn step(&mut self, phase: Phase, dt: f64) -> (f64, f64, f64) {
        let (speed_factor, direction_offset, gust_factor) = phase.targets();

        let target_speed = self.mean_speed * speed_factor;
        self.trend = self.ou_step(self.trend, target_speed, TREND_TIME_CONSTANT, 0.1 * target_speed, dt);
        let gust_sigma = GUST_INTENSITY * gust_factor * self.trend.max(0.5);
        self.gust = self.ou_step(self.gust, 0.0, GUST_TIME_CONSTANT, gust_sigma, dt);

        let target_direction = self.mean_direction + direction_offset;
        self.direction_mean = self.ou_step(self.direction_mean, target_direction, TREND_TIME_CONSTANT, 5.0, dt);
        self.direction_swing = self.ou_step(self.direction_swing, 0.0, DIRECTION_TIME_CONSTANT, 8.0 * gust_factor, dt);

        let speed = (self.trend + self.gust).max(0.0);
        let direction = (self.direction_mean + self.direction_swing).rem_euclid(360.0);
        let gust = speed + self.gust.abs() * 0.5;
        (speed, direction, gust)
    }

    fn next_gap_ms(&mut self, interval_ms: f64, jitter_ms: f64) -> i64 {
        let jitter = jitter_ms * self.unit_noise.sample(&mut self.rng);
        (interval_ms + jitter).max(50.0).round() as i64
    }

    fn dropout(&mut self) -> bool {
        self.rng.gen_bool(DROPOUT_PROBABILITY)
    }
}

fn log_summary(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let start_ms = parse_datetime(&args.start).context("Invalid --start")?;
    let end_ms = start_ms + i64::from(args.hours) * 3_600_000;
    let interval_ms = f64::from(args.interval_ms.max(1));
    let jitter_ms = f64::from(args.jitter_ms);

    let mut sim = WindSimulation::new(args.mean_speed, args.mean_direction, args.seed)?;

    log_summary(&"=".repeat(60), args.quiet);
    log_summary("WIND SENSOR SIMULATION", args.quiet);
    log_summary(&format!("  Start: {}", format_millis(start_ms)), args.quiet);
    log_summary(&format!("  Duration: {} hours", args.hours), args.quiet);
    log_summary(&format!("  Mean: {:.1} kn from {:.0} deg", args.mean_speed, args.mean_direction), args.quiet);
    log_summary(&format!("  Sampling: {} ms +/- {} ms", args.interval_ms, args.jitter_ms), args.quiet);
    if let Some(seed) = args.seed {
        log_summary(&format!("  Random seed: {seed}"), args.quiet);
    }
    log_summary(&"=".repeat(60), args.quiet);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "timestamp_ms,direction,speed_tenths,gusts_tenths")?;

    let mut time_ms = start_ms;
    let mut last_phase: Option<Phase> = None;
    let mut written: u64 = 0;
    let mut dropped: u64 = 0;

    while time_ms < end_ms {
        let progress = (time_ms - start_ms) as f64 / (end_ms - start_ms) as f64;
        let phase = Phase::from_progress(progress);
        if last_phase != Some(phase) {
            log_summary(&format!("[{:>5.1}%] {}", progress * 100.0, phase.name()), args.quiet);
            last_phase = Some(phase);
        }

        let gap_ms = sim.next_gap_ms(interval_ms, jitter_ms);
        let (speed, direction, gust) = sim.step(phase, gap_ms as f64 / 1_000.0);
        time_ms += gap_ms;

        if sim.dropout() {
            dropped += 1;
            continue;
        }

        let mut record = WindRecord::new(time_ms, direction.round() as i32 % 360, (speed * 10.0).round() as i32);
        record.gusts_tenths = (gust * 10.0).round() as i32;
        writeln!(
            out,
            "{},{},{},{}",
            record.time_ms, record.direction_deg, record.speed_tenths, record.gusts_tenths
        )?;
        written += 1;
    }
    out.flush()?;

    log_summary(&format!("Generated {written} readings ({dropped} dropped)"), args.quiet);
    Ok(())
}
