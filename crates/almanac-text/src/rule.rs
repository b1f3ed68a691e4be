//! RFC 5545 rule strings for weekly patterns.
//!
//! Rule strings are stored for reference alongside already-expanded
//! occurrences; they are not re-evaluated on read.

use chrono::{NaiveDate, Weekday};

use crate::weekday::WeekdaySet;

/// Two-letter RFC 5545 weekday code.
#[must_use]
pub const fn byday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// ## Summary
/// Builds `FREQ=WEEKLY;BYDAY=..[;UNTIL=YYYYMMDD]` for a weekday set.
///
/// Returns `None` for an empty set.
#[must_use]
pub fn weekly_rule(weekdays: WeekdaySet, until: Option<NaiveDate>) -> Option<String> {
    if weekdays.is_empty() {
        return None;
    }

    let byday = weekdays.iter().map(byday_code).collect::<Vec<_>>().join(",");
    let mut rule = format!("FREQ=WEEKLY;BYDAY={byday}");
    if let Some(until) = until {
        rule.push_str(&format!(";UNTIL={}", until.format("%Y%m%d")));
    }
    Some(rule)
}
