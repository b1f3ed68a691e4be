use chrono::{NaiveDate, NaiveTime};
use diesel::{pg::Pg, prelude::*};

use crate::db::{
    enums::{EventCategory, Priority},
    metadata::ExtractionMetadata,
    schema,
};

/// A date-bearing event pulled out of a document, awaiting import.
///
/// `event_date` holds an ISO date when one could be normalized, otherwise the
/// raw date text reported by the completion service.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::extracted_event)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::document::Document, foreign_key = document_id))]
pub struct ExtractedEvent {
    pub id: uuid::Uuid,
    pub document_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub priority: Priority,
    pub confidence: i16,
    pub is_imported: bool,
    pub metadata: ExtractionMetadata,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ExtractedEvent {
    /// ## Summary
    /// Parses `event_date` as an ISO date, if it is one.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        almanac_text::date::parse_iso_date(&self.event_date).ok()
    }
}

/// Insert struct for persisting an extraction result
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::extracted_event)]
pub struct NewExtractedEvent {
    pub id: uuid::Uuid,
    pub document_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub priority: Priority,
    pub confidence: i16,
    pub metadata: ExtractionMetadata,
}
