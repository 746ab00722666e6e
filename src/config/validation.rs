//! Config validation: unknown-key detection with edit-distance suggestions
//! and plausibility checks.
//!
//! The raw TOML is parsed into a `toml::Value` first and its key tree is
//! compared against the known field names, producing "did you mean?"
//! warnings. Normal serde deserialization follows. Warnings never reject a
//! config.

use std::collections::HashSet;

use super::defaults;
use super::AnalyzerConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for [`AnalyzerConfig`].
///
/// Maintained by hand to match the struct hierarchy in analyzer_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [autocorrelation]
        "autocorrelation",
        "autocorrelation.correlation_length",
        "autocorrelation.average_interval_millis",
        "autocorrelation.fit",
        "autocorrelation.fit.max_iterations",
        // [spectrum]
        "spectrum",
        "spectrum.average_interval_millis",
        "spectrum.display_fraction",
        // [chart]
        "chart",
        "chart.log_factor",
        "chart.min_points_per_bucket",
        // [selection]
        "selection",
        "selection.max_intervals",
        "selection.speed_from",
        "selection.speed_to",
        "selection.direction_from",
        "selection.direction_to",
        "selection.find_step_millis",
        // [storage]
        "storage",
        "storage.path",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Unknown Keys and Suggestions
// ============================================================================

/// Largest edit distance that still yields a "did you mean?" suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

fn section_key(section: &str, field: &str) -> String {
    if section.is_empty() {
        field.to_string()
    } else {
        format!("{section}.{field}")
    }
}

/// Split `autocorrelation.fit.max_iterations` into its section
/// `autocorrelation.fit` and field `max_iterations`.
fn split_key(key: &str) -> (&str, &str) {
    key.rsplit_once('.').unwrap_or(("", key))
}

/// Dotted paths in `value` that are not config keys, sorted.
///
/// Only known sections are descended into, so a misspelled or foreign
/// section is reported once rather than once per entry.
pub fn unknown_config_keys(value: &toml::Value, known: &HashSet<&str>) -> Vec<String> {
    let mut unknown = Vec::new();
    let Some(root) = value.as_table() else {
        return unknown;
    };

    let mut sections = vec![(String::new(), root)];
    while let Some((section, table)) = sections.pop() {
        for (field, entry) in table {
            let key = section_key(&section, field);
            if !known.contains(key.as_str()) {
                unknown.push(key);
            } else if let Some(sub) = entry.as_table() {
                sections.push((key, sub));
            }
        }
    }
    unknown.sort();
    unknown
}

/// Insert/delete/substitute distance between two key names.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

/// Nearest candidate within [`MAX_SUGGESTION_DISTANCE`]; ties go to the
/// alphabetically first key.
fn nearest<'a>(candidates: impl Iterator<Item = (usize, &'a str)>) -> Option<String> {
    candidates
        .filter(|&(dist, _)| dist <= MAX_SUGGESTION_DISTANCE)
        .min()
        .map(|(_, key)| key.to_string())
}

/// Closest known key for `unknown`.
///
/// The field name is compared against the other fields of its section
/// first. Only when none is close is the whole dotted path compared, which
/// catches misspelled section names.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let (section, field) = split_key(unknown);
    let siblings = known.iter().filter_map(|&key| {
        let (key_section, key_field) = split_key(key);
        (key_section == section).then(|| (edit_distance(field, key_field), key))
    });
    nearest(siblings)
        .or_else(|| nearest(known.iter().map(|&key| (edit_distance(unknown, key), key))))
}

/// Warn about every key in `raw_toml` that the config does not know.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    unknown_config_keys(&value, &known)
        .into_iter()
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Values that are accepted but will probably produce misleading charts.
pub fn validate_ranges(config: &AnalyzerConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let a = &config.autocorrelation;

    // Lags past the interval length only ever see zero pairs
    let interval_secs = a.average_interval_millis / 1_000;
    if interval_secs > 0 && a.correlation_length as i64 >= interval_secs {
        warnings.push(ValidationWarning {
            field: "autocorrelation.correlation_length".to_string(),
            message: format!(
                "correlation_length = {} s is not shorter than average_interval_millis ({} s)",
                a.correlation_length, interval_secs
            ),
            suggestion: None,
        });
    }

    let fraction = config.spectrum.display_fraction;
    if fraction > defaults::SPECTRUM_DISPLAY_FRACTION && fraction <= 1.0 {
        warnings.push(ValidationWarning {
            field: "spectrum.display_fraction".to_string(),
            message: format!(
                "display_fraction = {fraction} includes the mirrored half of the spectrum"
            ),
            suggestion: None,
        });
    }

    let sel = &config.selection;
    if sel.direction_from < 0.0 || sel.direction_to > defaults::FULL_CIRCLE_DEG {
        warnings.push(ValidationWarning {
            field: "selection.direction".to_string(),
            message: format!(
                "direction bounds {}..{} extend outside 0..360 degrees",
                sel.direction_from, sel.direction_to
            ),
            suggestion: None,
        });
    }
    if sel.speed_from < 0.0 {
        warnings.push(ValidationWarning {
            field: "selection.speed_from".to_string(),
            message: format!("speed_from = {} is negative", sel.speed_from),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================
