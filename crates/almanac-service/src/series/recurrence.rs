//! Rule evaluation for series materialization.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use rrule::{RRule, Tz, Unvalidated};

use crate::error::{ServiceError, ServiceResult};

/// Upper bound on occurrences produced by one evaluation.
pub const MAX_OCCURRENCES: u16 = 1000;

/// ## Summary
/// Evaluates `rule` from `start_date` and returns the generated dates up to
/// and including `last`, in ascending order.
///
/// Occurrences are anchored at midnight UTC, so only the date part of the
/// rule matters.
///
/// ## Errors
/// Returns `ValidationError` if the rule string cannot be parsed or built.
pub fn occurrence_dates(rule: &str, start_date: NaiveDate, last: NaiveDate) -> ServiceResult<Vec<NaiveDate>> {
    if last < start_date {
        return Ok(Vec::new());
    }

    let rrule = rule
        .trim()
        .trim_start_matches("RRULE:")
        .parse::<RRule<Unvalidated>>()
        .map_err(|err| ServiceError::ValidationError(format!("invalid recurrence rule {rule:?}: {err}")))?;

    let dt_start = start_date.and_time(NaiveTime::MIN).and_utc().with_timezone(&Tz::UTC);
    let window_end = last
        .succ_opt()
        .unwrap_or(last)
        .and_time(NaiveTime::MIN)
        .and_utc()
        - TimeDelta::seconds(1);

    let rrule_set = rrule
        .build(dt_start)
        .map_err(|err| ServiceError::ValidationError(format!("invalid recurrence rule {rule:?}: {err}")))?
        .before(window_end.with_timezone(&Tz::UTC));

    let result = rrule_set.all(MAX_OCCURRENCES);
    if result.limited {
        tracing::warn!(rule, limit = MAX_OCCURRENCES, "Occurrence limit reached, window truncated");
    }

    Ok(result
        .dates
        .into_iter()
        .map(|occurrence| occurrence.date_naive())
        .filter(|date| *date <= last)
        .collect())
}
