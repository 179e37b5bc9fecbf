//! Cell-level parsing for timestamps and coordinates.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::TimestampConfig;

/// Parses a timestamp cell using the configured formats.
///
/// Datetime formats are tried first, then RFC 3339 (offset timestamps keep
/// their local wall-clock time), then date-only formats at midnight.
/// Returns `None` for empty or unrecognized values.
#[must_use]
pub fn parse_timestamp(value: &str, config: &TimestampConfig) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in &config.datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    config
        .date_formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a coordinate cell. Returns `None` if the value is not a finite
/// number.
#[must_use]
pub fn parse_coordinate(value: &str) -> Option<f64> {
    let parsed = value.trim().parse::<f64>().ok()?;
    parsed.is_finite().then_some(parsed)
}
