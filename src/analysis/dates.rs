//! Parsing of user-supplied dates into epoch milliseconds (UTC).

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::processing::AnalysisError;
use crate::types::Interval;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a date or date-time.
///
/// Accepted: RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (also with `T`), `YYYY-MM-DD`
/// (midnight). Values without an offset are taken as UTC.
pub fn parse_datetime(input: &str) -> Result<i64, AnalysisError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp_millis());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(|| AnalysisError::InvalidDate(input.to_string()))
}

/// Parse both ends of a time range.
pub fn parse_range(from: &str, to: &str) -> Result<Interval, AnalysisError> {
    Interval::new(parse_datetime(from)?, parse_datetime(to)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_2_2020: i64 = 1_577_923_200_000;

    #[test]
    fn test_formats() {
        assert_eq!(parse_datetime("2020-01-02").unwrap(), JAN_2_2020);
        assert_eq!(parse_datetime("2020-01-02 00:01").unwrap(), JAN_2_2020 + 60_000);
        assert_eq!(parse_datetime("2020-01-02 00:00:05").unwrap(), JAN_2_2020 + 5_000);
        assert_eq!(parse_datetime("2020-01-02T01:00").unwrap(), JAN_2_2020 + 3_600_000);
        assert_eq!(
            parse_datetime("2020-01-02T02:00:00+01:00").unwrap(),
            JAN_2_2020 + 3_600_000
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(AnalysisError::InvalidDate(_))
        ));
        assert!(parse_datetime("2020-13-45").is_err());
    }

    #[test]
    fn test_range_must_not_be_inverted() {
        assert!(parse_range("2020-01-01", "2020-01-02").is_ok());
        assert!(matches!(
            parse_range("2020-01-02", "2020-01-01"),
            Err(AnalysisError::InvalidInterval { .. })
        ));
    }
}
