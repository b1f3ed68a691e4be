//! Calendar-date parsing for values returned by the completion service.

use chrono::{NaiveDate, NaiveTime};

use crate::error::{TextError, TextResult};

/// ## Summary
/// Parses a `YYYY-MM-DD` date, tolerating surrounding whitespace.
///
/// ## Errors
/// Returns `TextError::InvalidDate` if the value is not a real calendar date.
pub fn parse_iso_date(value: &str) -> TextResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| TextError::InvalidDate(format!("{value:?}: {err}")))
}

/// ## Summary
/// Parses an optional date field, treating blank strings as absent.
///
/// Invalid dates are logged and treated as absent so one bad field never
/// discards the rest of a result.
#[must_use]
pub fn parse_optional_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match parse_iso_date(value) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(error = %err, "Ignoring unparseable date");
            None
        }
    }
}

const TIME_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%I:%M %p"];

/// ## Summary
/// Parses an optional clock time (`14:30`, `14:30:00`, `2:30 PM`).
///
/// Anything else is treated as absent.
#[must_use]
pub fn parse_optional_time(value: Option<&str>) -> Option<NaiveTime> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    let upper = value.to_ascii_uppercase();
    let parsed = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&upper, format).ok());
    if parsed.is_none() {
        tracing::debug!(value, "Ignoring unparseable time");
    }
    parsed
}
