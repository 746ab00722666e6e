//! Analyzer Configuration - tunable analysis parameters as TOML values
//!
//! Each struct implements `Default` with the values in [`super::defaults`],
//! so an empty or missing file reproduces the standard analyses.
//!
//! ```toml
//! [autocorrelation]
//! correlation_length = 300
//! average_interval_millis = 1800000
//!
//! [autocorrelation.fit]
//! max_iterations = 1000
//!
//! [chart]
//! log_factor = 1.05
//! min_points_per_bucket = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WIND_ANALYZER_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "analyzer_config.toml";

/// Root of the analyzer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub autocorrelation: AutocorrelationConfig,

    #[serde(default)]
    pub spectrum: SpectrumConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl AnalyzerConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WIND_ANALYZER_CONFIG` environment variable
    /// 2. `./analyzer_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analyzer config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./analyzer_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analyzer config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Unknown keys are only warnings; serde ignores them
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Analyzer config saved");
        Ok(())
    }

    /// Validate all parameters.
    ///
    /// Rules:
    /// - Lengths, counts and interval widths must be > 0
    /// - The logarithmic factor must be > 1
    /// - Filter bounds must satisfy `from < to`
    /// - Every floating-point value must be finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let a = &self.autocorrelation;
        if a.correlation_length == 0 {
            errors.push("autocorrelation.correlation_length must be > 0".to_string());
        }
        if a.average_interval_millis <= 0 {
            errors.push("autocorrelation.average_interval_millis must be > 0".to_string());
        }
        if a.fit.max_iterations == 0 {
            errors.push("autocorrelation.fit.max_iterations must be > 0".to_string());
        }

        let s = &self.spectrum;
        if s.average_interval_millis <= 0 {
            errors.push("spectrum.average_interval_millis must be > 0".to_string());
        }
        if !(s.display_fraction > 0.0 && s.display_fraction <= 1.0) {
            errors.push(format!(
                "spectrum.display_fraction must be in (0, 1] (got {})",
                s.display_fraction
            ));
        }

        let c = &self.chart;
        if !c.log_factor.is_finite() || c.log_factor <= 1.0 {
            errors.push(format!(
                "chart.log_factor must be a finite value > 1 (got {})",
                c.log_factor
            ));
        }
        if c.min_points_per_bucket == 0 {
            errors.push("chart.min_points_per_bucket must be > 0".to_string());
        }

        let sel = &self.selection;
        if sel.max_intervals <= 0 {
            errors.push("selection.max_intervals must be > 0".to_string());
        }
        if sel.find_step_millis <= 0 {
            errors.push("selection.find_step_millis must be > 0".to_string());
        }
        Self::check_bounds(sel.speed_from, sel.speed_to, "selection.speed", &mut errors);
        Self::check_bounds(
            sel.direction_from,
            sel.direction_to,
            "selection.direction",
            &mut errors,
        );

        if self.storage.path.trim().is_empty() {
            errors.push("storage.path must not be empty".to_string());
        }

        for w in super::validation::validate_ranges(self) {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_bounds(from: f64, to: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, catch them explicitly
        if !from.is_finite() || !to.is_finite() {
            errors.push(format!(
                "{name}: bounds must be finite (got from={from}, to={to})"
            ));
            return;
        }
        if from >= to {
            errors.push(format!("{name}: from ({from}) must be < to ({to})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Autocorrelation
// ============================================================================

/// Autocorrelation curve and fit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationConfig {
    /// Maximum lag in seconds; the curve has this many points.
    #[serde(default = "default_correlation_length")]
    pub correlation_length: usize,

    /// Sub-interval width used when selecting by average speed/direction.
    #[serde(default = "default_autocorrelation_interval")]
    pub average_interval_millis: i64,

    #[serde(default)]
    pub fit: FitConfig,
}

fn default_correlation_length() -> usize { defaults::CORRELATION_LENGTH }
fn default_autocorrelation_interval() -> i64 { defaults::AUTOCORRELATION_AVERAGE_INTERVAL_MILLIS }

impl Default for AutocorrelationConfig {
    fn default() -> Self {
        Self {
            correlation_length: default_correlation_length(),
            average_interval_millis: default_autocorrelation_interval(),
            fit: FitConfig::default(),
        }
    }
}

/// Least-squares solver limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize { defaults::FIT_MAX_ITERATIONS }

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

// ============================================================================
// Spectrum
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Sub-interval width used when selecting by average speed.
    #[serde(default = "default_spectrum_interval")]
    pub average_interval_millis: i64,

    /// Leading fraction of the FFT bins returned for display.
    #[serde(default = "default_display_fraction")]
    pub display_fraction: f64,
}

fn default_spectrum_interval() -> i64 { defaults::SPECTRUM_AVERAGE_INTERVAL_MILLIS }
fn default_display_fraction() -> f64 { defaults::SPECTRUM_DISPLAY_FRACTION }

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            average_interval_millis: default_spectrum_interval(),
            display_fraction: default_display_fraction(),
        }
    }
}

// ============================================================================
// Chart Averaging
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_log_factor")]
    pub log_factor: f64,

    #[serde(default = "default_min_points")]
    pub min_points_per_bucket: usize,
}

fn default_log_factor() -> f64 { defaults::LOG_AVERAGE_FACTOR }
fn default_min_points() -> usize { defaults::LOG_AVERAGE_MIN_POINTS }

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            log_factor: default_log_factor(),
            min_points_per_bucket: default_min_points(),
        }
    }
}

// ============================================================================
// Interval Selection
// ============================================================================

/// Limits and default bounds for selecting intervals by average values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Maximum number of sub-intervals examined by one selection.
    #[serde(default = "default_max_intervals")]
    pub max_intervals: i64,

    /// Default speed bounds (knots) when only a direction filter is given.
    #[serde(default = "default_speed_from")]
    pub speed_from: f64,
    #[serde(default = "default_speed_to")]
    pub speed_to: f64,

    /// Default direction bounds (degrees) when only a speed filter is given.
    #[serde(default = "default_direction_from")]
    pub direction_from: f64,
    #[serde(default = "default_direction_to")]
    pub direction_to: f64,

    /// Step used by the time-range search.
    #[serde(default = "default_find_step")]
    pub find_step_millis: i64,
}

fn default_max_intervals() -> i64 { defaults::MAX_SELECTION_INTERVALS }
fn default_speed_from() -> f64 { defaults::DEFAULT_SPEED_FROM }
fn default_speed_to() -> f64 { defaults::DEFAULT_SPEED_TO }
fn default_direction_from() -> f64 { 0.0 }
fn default_direction_to() -> f64 { defaults::FULL_CIRCLE_DEG }
fn default_find_step() -> i64 { defaults::FIND_TIMES_INTERVAL_MILLIS }

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_intervals: default_max_intervals(),
            speed_from: default_speed_from(),
            speed_to: default_speed_to(),
            direction_from: default_direction_from(),
            direction_to: default_direction_to(),
            find_step_millis: default_find_step(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the sled record database.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    defaults::DEFAULT_STORAGE_PATH.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.autocorrelation.correlation_length, 300);
        assert_eq!(config.autocorrelation.average_interval_millis, 1_800_000);
        assert_eq!(config.autocorrelation.fit.max_iterations, 1_000);
        assert_eq!(config.spectrum.average_interval_millis, 3_600_000);
        assert_eq!(config.selection.max_intervals, 10_000);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: AnalyzerConfig = toml::from_str("").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_given_keys() {
        let config: AnalyzerConfig = toml::from_str(
            r#"
            [autocorrelation]
            correlation_length = 120

            [chart]
            log_factor = 1.2
            "#,
        )
        .unwrap();
        assert_eq!(config.autocorrelation.correlation_length, 120);
        assert_eq!(config.autocorrelation.average_interval_millis, 1_800_000);
        assert!((config.chart.log_factor - 1.2).abs() < 1e-12);
        assert_eq!(config.chart.min_points_per_bucket, 5);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AnalyzerConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: AnalyzerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AnalyzerConfig::default();
        config.autocorrelation.correlation_length = 0;
        config.chart.log_factor = 1.0;
        config.selection.speed_from = 10.0;
        config.selection.speed_to = 5.0;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("correlation_length")));
                assert!(errors.iter().any(|e| e.contains("log_factor")));
                assert!(errors.iter().any(|e| e.contains("selection.speed")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_nan() {
        let mut config = AnalyzerConfig::default();
        config.spectrum.display_fraction = f64::NAN;
        config.selection.direction_to = f64::NAN;
        let err = config.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("display_fraction"));
        assert!(text.contains("selection.direction"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analyzer_config.toml");
        std::fs::write(&path, "[storage]\npath = \"/tmp/wind\"\n").unwrap();

        let config = AnalyzerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.storage.path, "/tmp/wind");
    }

    #[test]
    fn test_load_from_file_reports_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[chart]\nmin_points_per_bucket = 0\n").unwrap();

        assert!(matches!(
            AnalyzerConfig::load_from_file(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = AnalyzerConfig::load_from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
