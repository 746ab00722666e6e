//! Config Validation Tests
//!
//! Typo detection and range validation of the analyzer config, exercised
//! through the public API without touching the analysis engines.

use wind_analyzer::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use wind_analyzer::config::{AnalyzerConfig, ConfigError};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_chart_key_warns_with_suggestion() {
    let toml_str = r#"
[chart]
log_factr = 1.1
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("log_factr"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("chart.log_factor"));
}

#[test]
fn typo_in_nested_fit_section_warns() {
    let toml_str = r#"
[autocorrelation.fit]
max_iteratons = 500
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("autocorrelation.fit.max_iterations")
    );
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[autocorrelation]
correlation_length = 600
average_interval_millis = 3600000

[autocorrelation.fit]
max_iterations = 200

[spectrum]
average_interval_millis = 3600000
display_fraction = 0.5

[chart]
log_factor = 1.1
min_points_per_bucket = 3

[selection]
max_intervals = 5000
speed_from = 0.0
speed_to = 60.0
direction_from = 0.0
direction_to = 360.0
find_step_millis = 600000

[storage]
path = "/var/lib/wind"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce no warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
    let config: AnalyzerConfig = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.autocorrelation.correlation_length, 600);
}

#[test]
fn completely_unknown_section_has_no_suggestion() {
    let warnings = validate_unknown_keys("[weather_station]\nlatitude = 47.5\n");
    assert_eq!(warnings.len(), 1, "the section is reported, not its entries");
    assert_eq!(warnings[0].field, "weather_station");
    assert!(warnings[0].suggestion.is_none());
}

#[test]
fn malformed_toml_yields_no_key_warnings() {
    assert!(validate_unknown_keys("[chart\nlog_factor = ").is_empty());
}

#[test]
fn every_known_key_suggests_itself() {
    let known = known_config_keys();
    for key in &known {
        assert_eq!(suggest_correction(key, &known).as_deref(), Some(*key));
    }
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_is_valid_and_quiet() {
    let config = AnalyzerConfig::default();
    assert!(config.validate().is_ok());
    assert!(validate_ranges(&config).is_empty());
}

#[test]
fn invalid_values_are_all_reported() {
    let mut config = AnalyzerConfig::default();
    config.chart.log_factor = 1.0;
    config.selection.speed_from = 20.0;
    config.selection.speed_to = 10.0;
    config.spectrum.display_fraction = f64::NAN;

    match config.validate() {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 3, "got: {errors:?}");
            assert!(errors.iter().any(|e| e.contains("chart.log_factor")));
            assert!(errors.iter().any(|e| e.contains("selection.speed")));
            assert!(errors.iter().any(|e| e.contains("spectrum.display_fraction")));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn suspicious_values_only_warn() {
    let mut config = AnalyzerConfig::default();
    config.autocorrelation.correlation_length = 3_600;
    config.spectrum.display_fraction = 1.0;
    config.selection.direction_to = 400.0;

    assert!(config.validate().is_ok());
    let fields: Vec<String> = validate_ranges(&config).into_iter().map(|w| w.field).collect();
    assert_eq!(fields.len(), 3, "got: {fields:?}");
    assert!(fields.contains(&"autocorrelation.correlation_length".to_string()));
    assert!(fields.contains(&"spectrum.display_fraction".to_string()));
    assert!(fields.contains(&"selection.direction".to_string()));
}

#[test]
fn config_file_round_trip_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analyzer_config.toml");

    let mut config = AnalyzerConfig::default();
    config.spectrum.average_interval_millis = 2 * 3_600_000;
    config.storage.path = "elsewhere".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = AnalyzerConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[chart]\nmin_points_per_bucket = 0\n").unwrap();

    assert!(matches!(
        AnalyzerConfig::load_from_file(&path),
        Err(ConfigError::Validation(_))
    ));
}
