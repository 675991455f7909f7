//! Calendar-date normalization.
//!
//! Attendance is keyed by calendar date, never by instant. Every date entering
//! the core passes through here so that comparison, storage and the duplicate
//! check all see the same `(year, month, day)` value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::json;

use crate::error::AppError;

/// Errors that can occur during date normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateNormalizationError {
    #[error("Date is empty")]
    Empty,

    #[error("Invalid date format: '{0}' (expected YYYY-MM-DD, optionally followed by a time)")]
    InvalidFormat(String),
}

impl From<DateNormalizationError> for AppError {
    fn from(e: DateNormalizationError) -> Self {
        AppError::bad_request(e.to_string(), json!({ "field": "date" }))
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Reduces a date string to its calendar date.
///
/// # Normalization Rules
///
/// 1. **Plain dates** (`2024-03-10`) are taken as-is
/// 2. **Offset timestamps** (`2024-03-10T23:30:00-03:00`) keep the date as
///    written in their own offset; they are *not* converted to UTC first
/// 3. **Naive timestamps** (`2024-03-10T08:15:00`, `2024-03-10 08:15`) drop the time
/// 4. Surrounding whitespace is ignored
///
/// # Errors
///
/// Returns [`DateNormalizationError::Empty`] for blank input and
/// [`DateNormalizationError::InvalidFormat`] for anything else unparseable.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_date("2024-03-10T23:30:00-03:00").unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
/// );
/// ```
pub fn normalize_date(input: &str) -> Result<NaiveDate, DateNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateNormalizationError::Empty);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| DateNormalizationError::InvalidFormat(trimmed.to_string()))
}

/// Conversion of any date-like value into a calendar date.
///
/// Timezone-aware values keep the local date of their own offset.
pub trait IntoCalendarDate {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError>;
}

impl IntoCalendarDate for NaiveDate {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError> {
        Ok(self)
    }
}

impl IntoCalendarDate for NaiveDateTime {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError> {
        Ok(self.date())
    }
}

impl<Tz: TimeZone> IntoCalendarDate for DateTime<Tz> {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError> {
        Ok(self.date_naive())
    }
}

impl IntoCalendarDate for &str {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError> {
        normalize_date(self)
    }
}

impl IntoCalendarDate for &String {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError> {
        normalize_date(self)
    }
}

impl IntoCalendarDate for String {
    fn into_calendar_date(self) -> Result<NaiveDate, DateNormalizationError> {
        normalize_date(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_date() {
        assert_eq!(normalize_date("2024-03-10").unwrap(), date(2024, 3, 10));
        assert_eq!(normalize_date("  2024-03-10 ").unwrap(), date(2024, 3, 10));
    }

    #[test]
    fn test_negative_offset_keeps_written_day() {
        // 23:30 at -03:00 is already the 11th in UTC.
        assert_eq!(
            normalize_date("2024-03-10T23:30:00-03:00").unwrap(),
            date(2024, 3, 10)
        );
    }

    #[test]
    fn test_positive_offset_keeps_written_day() {
        assert_eq!(
            normalize_date("2024-03-10T00:15:00+05:30").unwrap(),
            date(2024, 3, 10)
        );
    }

    #[test]
    fn test_utc_timestamp() {
        assert_eq!(
            normalize_date("2024-03-10T12:00:00.000Z").unwrap(),
            date(2024, 3, 10)
        );
    }

    #[test]
    fn test_naive_timestamps() {
        assert_eq!(
            normalize_date("2024-03-10T12:00:00").unwrap(),
            date(2024, 3, 10)
        );
        assert_eq!(normalize_date("2024-03-10 08:15").unwrap(), date(2024, 3, 10));
        assert_eq!(
            normalize_date("2024-03-10 08:15:42.123").unwrap(),
            date(2024, 3, 10)
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_date("   "), Err(DateNormalizationError::Empty));
        assert!(matches!(
            normalize_date("10/03/2024"),
            Err(DateNormalizationError::InvalidFormat(_))
        ));
        assert!(normalize_date("2024-02-30").is_err());
        assert!(normalize_date("2024-13-01").is_err());
    }

    #[test]
    fn test_into_calendar_date_for_typed_values() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let late_evening = offset.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(late_evening.into_calendar_date().unwrap(), date(2024, 3, 10));

        let utc = Utc.with_ymd_and_hms(2024, 3, 11, 2, 30, 0).unwrap();
        assert_eq!(utc.into_calendar_date().unwrap(), date(2024, 3, 11));

        let naive = date(2024, 3, 10).and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(naive.into_calendar_date().unwrap(), date(2024, 3, 10));

        assert_eq!("2024-03-10".into_calendar_date().unwrap(), date(2024, 3, 10));
    }

    #[test]
    fn test_error_maps_to_validation() {
        let err: AppError = normalize_date("nope").unwrap_err().into();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.details()["field"], "date");
    }
}
