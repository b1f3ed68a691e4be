//! Conversion of per-line extraction results into staged event rows.

use uuid::Uuid;

use almanac_core::constants::{
    CONFIDENCE_DEFERRED_RANGE, CONFIDENCE_NORMALIZED, CONFIDENCE_RAW_DATE,
};
use almanac_db::db::enums::{EventCategory, Priority};
use almanac_db::db::metadata::{ExtractionKind, ExtractionMetadata};
use almanac_db::model::extracted_event::NewExtractedEvent;
use almanac_text::date::{parse_optional_date, parse_optional_time};
use almanac_text::rule::weekly_rule;
use almanac_text::WeekdaySet;

use crate::extraction::LineExtraction;

/// ## Summary
/// Converts one extraction result into one staged event.
///
/// - A range result with both dates (start not after end) and a non-empty
///   weekday token becomes a deferred range event dated at its start,
///   confidence 85. It is expanded only at import time, where a token naming
///   no recognizable weekday yields no occurrences.
/// - Otherwise a normalized date gives confidence 90, and the raw date text
///   kept verbatim as the event date gives confidence 70.
///
/// Results with neither a usable date nor raw date text, or with an empty
/// title, are dropped.
#[must_use]
pub fn materialize(document_id: Uuid, result: &LineExtraction) -> Option<NewExtractedEvent> {
    let title = result.event.trim();
    if title.is_empty() {
        tracing::debug!(line_number = result.line_number, "Dropping result without a title");
        return None;
    }

    let start = parse_optional_date(result.normalized_date.as_deref());
    let end = parse_optional_date(result.normalized_end_date.as_deref());
    let raw_date_text = non_blank(result.date_text.as_deref());

    let (event_date, confidence, kind) = match deferred_range(result, start, end) {
        Some(kind @ ExtractionKind::DeferredRange { start_date, .. }) => {
            (start_date.to_string(), CONFIDENCE_DEFERRED_RANGE, kind)
        }
        _ => {
            let concrete = ExtractionKind::Concrete {
                normalized_date: start,
                end_date: end,
            };
            match (start, raw_date_text.as_deref()) {
                (Some(date), _) => (date.to_string(), CONFIDENCE_NORMALIZED, concrete),
                (None, Some(raw)) => (raw.to_string(), CONFIDENCE_RAW_DATE, concrete),
                (None, None) => {
                    tracing::debug!(line_number = result.line_number, "Dropping result without a date");
                    return None;
                }
            }
        }
    };

    let line_number = i32::try_from(result.line_number).unwrap_or(i32::MAX);

    Some(NewExtractedEvent {
        id: Uuid::now_v7(),
        document_id,
        title: title.to_string(),
        description: non_blank(result.description.as_deref()),
        event_date,
        start_time: parse_optional_time(result.start_time.as_deref()),
        end_time: parse_optional_time(result.end_time.as_deref()),
        location: non_blank(result.location.as_deref()),
        category: result
            .category
            .as_deref()
            .map(EventCategory::from_label)
            .unwrap_or_default(),
        priority: result
            .priority
            .as_deref()
            .and_then(|p| p.parse::<Priority>().ok())
            .unwrap_or_default(),
        confidence,
        metadata: ExtractionMetadata {
            line_number,
            raw_date_text,
            recurrence_pattern: non_blank(result.recurrence_pattern.as_deref()),
            kind,
        },
    })
}

fn deferred_range(
    result: &LineExtraction,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Option<ExtractionKind> {
    if !result.is_range_with_day {
        return None;
    }

    let day_of_week = non_blank(result.day_of_week.as_deref());

    match (start, end, day_of_week) {
        (Some(start_date), Some(end_date), Some(day_of_week)) if start_date <= end_date => {
            let weekdays = WeekdaySet::parse(&day_of_week);
            if weekdays.is_empty() {
                tracing::warn!(
                    line_number = result.line_number,
                    day_of_week = %day_of_week,
                    "Range weekday token names no weekday, it will expand to nothing"
                );
            }
            Some(ExtractionKind::DeferredRange {
                start_date,
                end_date,
                weekdays,
                day_of_week,
                rrule: weekly_rule(weekdays, Some(end_date)),
            })
        }
        _ => {
            tracing::warn!(
                line_number = result.line_number,
                "Range result is missing dates or weekdays, keeping it as a single event"
            );
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
