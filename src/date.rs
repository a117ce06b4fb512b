//! Date bounds for range queries.
//!
//! The logs endpoint expects `HH:MM DD/MM/YY` when a bound has a time of day
//! and `DD/MM/YY` otherwise. Inputs may be ISO dates (`2024-01-05`,
//! `2024/01/05`) or day-first dates (`05/01/24`, `05/01/2024`, `05-01-2024`),
//! optionally followed by a space or `T` and `HH:MM` or `HH:MM:SS`.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Output format for bounds carrying a time of day.
pub const DATETIME_OUTPUT: &str = "%H:%M %d/%m/%y";

/// Output format for date-only bounds.
pub const DATE_OUTPUT: &str = "%d/%m/%y";

// `%Y` also accepts two digits, so year-first formats are only tried when the
// leading field is a four-digit year.
const YEAR_FIRST_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_FORMATS: [&str; 3] = ["%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const SEPARATORS: [char; 2] = [' ', 'T'];

/// A date bound that matches none of the accepted formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date format: {input}")]
pub struct DateParseError {
    /// The rejected input
    pub input: String,
}

/// Formats a caller-supplied date bound for the logs endpoint.
///
/// # Errors
///
/// Returns [`DateParseError`] if `input` is not a recognizable date.
///
/// # Example
///
/// ```
/// use facespace_logs::date::format_date_bound;
///
/// assert_eq!(format_date_bound("2024-01-05 13:30").unwrap(), "13:30 05/01/24");
/// assert_eq!(format_date_bound("2024-01-05").unwrap(), "05/01/24");
/// assert!(format_date_bound("not-a-date").is_err());
/// ```
pub fn format_date_bound(input: &str) -> Result<String, DateParseError> {
    let trimmed = input.trim();

    if let Some(datetime) = parse_datetime(trimmed) {
        return Ok(datetime.format(DATETIME_OUTPUT).to_string());
    }
    if let Some(date) = parse_date(trimmed) {
        return Ok(date.format(DATE_OUTPUT).to_string());
    }

    tracing::error!("Invalid date format: {input}");
    Err(DateParseError {
        input: input.to_string(),
    })
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let formats: &[&str] = if starts_with_year(input) {
        &YEAR_FIRST_FORMATS
    } else {
        &DAY_FIRST_FORMATS
    };
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
}

fn starts_with_year(input: &str) -> bool {
    input
        .split(['-', '/'])
        .next()
        .is_some_and(|field| field.len() == 4 && field.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = input.split_once(SEPARATORS)?;
    let date = parse_date(date_part)?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|format| chrono::NaiveTime::parse_from_str(time_part.trim(), format).ok())?;
    Some(date.and_time(time))
}
