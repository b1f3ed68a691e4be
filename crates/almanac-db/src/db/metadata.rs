//! Typed extraction provenance stored in `extracted_event.metadata`.
//!
//! The row keeps a flat JSON object (readable from SQL) while Rust code only
//! ever sees the tagged [`ExtractionKind`]. A deferred range event cannot be
//! constructed without both endpoints and a non-empty weekday set, and the
//! stored `is_range_with_day`/`is_expanded_from_range` flags are derived from
//! the variant rather than set independently.

use chrono::NaiveDate;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Jsonb;
use serde::{Deserialize, Serialize};
use std::io::Write;

use almanac_text::WeekdaySet;

/// Provenance of one extracted event.
#[derive(Debug, Clone, PartialEq, Eq, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[diesel(sql_type = Jsonb)]
#[serde(into = "MetadataRecord", try_from = "MetadataRecord")]
pub struct ExtractionMetadata {
    /// Line number within the normalized document text.
    pub line_number: i32,
    /// Date text exactly as it appeared in the document.
    pub raw_date_text: Option<String>,
    /// Recurrence keyword reported by the completion service ("weekly", ...).
    pub recurrence_pattern: Option<String>,
    pub kind: ExtractionKind,
}

/// Whether the event is a single date or an unexpanded weekday range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionKind {
    /// A single dated event, optionally spanning to `end_date`.
    Concrete {
        normalized_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
    /// "These weekdays between these dates", expanded only at import time.
    DeferredRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
        weekdays: WeekdaySet,
        /// Weekday text as reported, kept for display.
        day_of_week: String,
        /// Reference rule string, e.g. `FREQ=WEEKLY;BYDAY=MO;UNTIL=20251117`.
        rrule: Option<String>,
    },
}

impl ExtractionMetadata {
    #[must_use]
    pub const fn is_range_with_day(&self) -> bool {
        matches!(self.kind, ExtractionKind::DeferredRange { .. })
    }
}

/// Flat JSON shape persisted in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetadataRecord {
    line_number: i32,
    #[serde(default)]
    raw_date_text: Option<String>,
    #[serde(default)]
    normalized_date: Option<NaiveDate>,
    #[serde(default)]
    normalized_end_date: Option<NaiveDate>,
    #[serde(default)]
    day_of_week: Option<String>,
    #[serde(default)]
    weekdays: Option<WeekdaySet>,
    #[serde(default)]
    recurrence_pattern: Option<String>,
    #[serde(default)]
    rrule: Option<String>,
    #[serde(default)]
    is_range_with_day: bool,
    #[serde(default)]
    is_expanded_from_range: bool,
}

impl From<ExtractionMetadata> for MetadataRecord {
    fn from(meta: ExtractionMetadata) -> Self {
        let base = Self {
            line_number: meta.line_number,
            raw_date_text: meta.raw_date_text,
            normalized_date: None,
            normalized_end_date: None,
            day_of_week: None,
            weekdays: None,
            recurrence_pattern: meta.recurrence_pattern,
            rrule: None,
            is_range_with_day: false,
            is_expanded_from_range: false,
        };

        match meta.kind {
            ExtractionKind::Concrete {
                normalized_date,
                end_date,
            } => Self {
                normalized_date,
                normalized_end_date: end_date,
                ..base
            },
            ExtractionKind::DeferredRange {
                start_date,
                end_date,
                weekdays,
                day_of_week,
                rrule,
            } => Self {
                normalized_date: Some(start_date),
                normalized_end_date: Some(end_date),
                day_of_week: Some(day_of_week),
                weekdays: Some(weekdays),
                rrule,
                is_range_with_day: true,
                ..base
            },
        }
    }
}

impl TryFrom<MetadataRecord> for ExtractionMetadata {
    type Error = String;

    fn try_from(record: MetadataRecord) -> Result<Self, Self::Error> {
        let kind = if record.is_range_with_day {
            let (Some(start_date), Some(end_date)) =
                (record.normalized_date, record.normalized_end_date)
            else {
                return Err("range event is missing a start or end date".to_string());
            };
            let weekdays = record.weekdays.unwrap_or_default();
            if weekdays.is_empty() {
                return Err("range event has an empty weekday set".to_string());
            }
            ExtractionKind::DeferredRange {
                start_date,
                end_date,
                weekdays,
                day_of_week: record.day_of_week.unwrap_or_else(|| weekdays.to_string()),
                rrule: record.rrule,
            }
        } else {
            ExtractionKind::Concrete {
                normalized_date: record.normalized_date,
                end_date: record.normalized_end_date,
            }
        };

        Ok(Self {
            line_number: record.line_number,
            raw_date_text: record.raw_date_text,
            recurrence_pattern: record.recurrence_pattern,
            kind,
        })
    }
}

impl ToSql<Jsonb, Pg> for ExtractionMetadata {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        // JSONB binary format version byte.
        out.write_all(&[1])?;
        serde_json::to_writer(&mut *out, self)?;
        Ok(IsNull::No)
    }
}

impl FromSql<Jsonb, Pg> for ExtractionMetadata {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        match value.as_bytes().split_first() {
            Some((&1, json)) => Ok(serde_json::from_slice(json)?),
            _ => Err("Unsupported JSONB encoding version".into()),
        }
    }
}
