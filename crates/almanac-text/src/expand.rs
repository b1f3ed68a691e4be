//! Recurrence expansion for "date range + weekdays" events.

use chrono::{Datelike, NaiveDate};

use crate::weekday::WeekdaySet;

/// ## Summary
/// Expands an inclusive date range into the dates falling on the given weekdays.
///
/// Walks every calendar day from `start` to `end` (both inclusive) and emits
/// each day whose weekday is in `weekdays`, in ascending order. An empty
/// weekday set or an inverted range yields no dates.
#[must_use]
pub fn expand(start: NaiveDate, end: NaiveDate, weekdays: WeekdaySet) -> Vec<NaiveDate> {
    if weekdays.is_empty() || start > end {
        return Vec::new();
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| weekdays.contains(day.weekday()))
        .collect()
}

/// ## Summary
/// Expands a range using free-text weekday tokens (see [`WeekdaySet::parse`]).
#[must_use]
pub fn expand_tokens(start: NaiveDate, end: NaiveDate, weekday_text: &str) -> Vec<NaiveDate> {
    expand(start, end, WeekdaySet::parse(weekday_text))
}
