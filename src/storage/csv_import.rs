//! CSV import of wind records.
//!
//! One record per line: `timestamp_ms,direction,speed_tenths[,gusts_tenths]`.
//! A header line starting with `timestamp`, blank lines and `#` comments are
//! skipped. Malformed lines are logged and counted, not fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::StorageError;
use crate::types::WindRecord;

/// Result of reading a CSV file.
#[derive(Debug, Clone, Default)]
pub struct CsvImport {
    pub records: Vec<WindRecord>,
    /// Lines that could not be parsed
    pub rejected: usize,
}

/// Load wind records from a CSV file.
pub fn load_csv(path: &Path) -> Result<CsvImport, StorageError> {
    let file = File::open(path)?;
    let import = read_csv(BufReader::new(file))?;
    tracing::info!(
        count = import.records.len(),
        rejected = import.rejected,
        path = %path.display(),
        "Loaded wind records from CSV"
    );
    Ok(import)
}

/// Read wind records from any buffered reader.
pub fn read_csv<R: BufRead>(reader: R) -> Result<CsvImport, StorageError> {
    let mut import = CsvImport::default();

    for (index, line) in reader.lines().enumerate() {
        let line_num = index + 1;
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if line_num == 1 && trimmed.to_ascii_lowercase().starts_with("timestamp") {
            continue;
        }

        match parse_csv_line(trimmed, line_num) {
            Ok(record) => import.records.push(record),
            Err(e) => {
                if import.rejected < 10 {
                    tracing::warn!(line = line_num, error = %e, "Skipping CSV line");
                }
                import.rejected += 1;
            }
        }
    }

    Ok(import)
}

/// Parse a single CSV line into a [`WindRecord`].
pub fn parse_csv_line(line: &str, line_num: usize) -> Result<WindRecord, StorageError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(StorageError::Csv {
            line: line_num,
            message: format!("expected 3 or 4 fields, got {}", fields.len()),
        });
    }

    let time_ms = parse_field::<i64>(fields[0], "timestamp", line_num)?;
    let direction = parse_field::<i32>(fields[1], "direction", line_num)?;
    let speed = parse_field::<i32>(fields[2], "speed", line_num)?;

    let mut record = WindRecord::new(time_ms, direction, speed);
    if let Some(gusts) = fields.get(3) {
        record.gusts_tenths = parse_field::<i32>(gusts, "gusts", line_num)?;
    }
    Ok(record)
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    name: &str,
    line_num: usize,
) -> Result<T, StorageError>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| StorageError::Csv {
        line: line_num,
        message: format!("invalid {name} '{value}': {e}"),
    })
}
