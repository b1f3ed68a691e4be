//! Repository traits over the persisted model.
//!
//! Operations that must be atomic (import, promotion, exclusion, override
//! upsert) are single trait methods so each implementation can run them in
//! one transaction.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use almanac_db::db::enums::CandidateStatus;
use almanac_db::model::calendar_event::{CalendarEvent, InstanceChanges, NewCalendarEvent};
use almanac_db::model::candidate::{NewRecurringCandidate, RecurringCandidate};
use almanac_db::model::document::{Document, NewDocument};
use almanac_db::model::extracted_event::{ExtractedEvent, NewExtractedEvent};
use almanac_db::model::series::{EventOverride, EventSeries, NewEventOverride, NewEventSeries};

use crate::error::ServiceResult;

pub use postgres::PgStore;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert_document(&self, document: &NewDocument<'_>) -> ServiceResult<Document>;

    async fn find_document(&self, id: Uuid) -> ServiceResult<Option<Document>>;

    /// An owner's documents, newest first.
    async fn list_documents(&self, owner_id: Uuid) -> ServiceResult<Vec<Document>>;

    /// Moves the document to `processing` unless a run started after
    /// `stale_before` still holds it, and in the same transaction discards
    /// the extracted events an earlier run left un-imported. Returns `None`
    /// (changing nothing) when the claim is refused.
    async fn claim_document(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> ServiceResult<Option<Document>>;

    /// Raises progress; never lowers it.
    async fn advance_progress(&self, id: Uuid, progress: i16) -> ServiceResult<()>;

    async fn set_extracted_text(&self, id: Uuid, excerpt: &str) -> ServiceResult<()>;

    async fn complete_document(&self, id: Uuid, processing_time_secs: f64) -> ServiceResult<()>;

    async fn fail_document(&self, id: Uuid, message: &str) -> ServiceResult<()>;

    /// Deletes the document and its extracted events. Returns `false` if absent.
    async fn delete_document(&self, id: Uuid) -> ServiceResult<bool>;
}

#[async_trait]
pub trait ExtractedEventRepository: Send + Sync {
    async fn insert_extracted(&self, events: &[NewExtractedEvent]) -> ServiceResult<usize>;

    async fn find_extracted(&self, id: Uuid) -> ServiceResult<Option<ExtractedEvent>>;

    /// A document's extracted events in insertion order.
    async fn list_extracted(&self, document_id: Uuid, pending_only: bool) -> ServiceResult<Vec<ExtractedEvent>>;

    /// The calendar events an import of `event_id` created.
    async fn imported_events(&self, event_id: Uuid) -> ServiceResult<Vec<CalendarEvent>>;

    /// Marks the event imported and inserts `rows` atomically.
    ///
    /// Returns the inserted calendar event IDs, or `None` (with nothing
    /// inserted) when the event was already imported.
    async fn commit_import(&self, event_id: Uuid, rows: &[NewCalendarEvent]) -> ServiceResult<Option<Vec<Uuid>>>;
}

#[async_trait]
pub trait CalendarRepository: Send + Sync {
    /// An owner's events not linked to any series, ordered by date.
    async fn unlinked_events(&self, owner_id: Uuid) -> ServiceResult<Vec<CalendarEvent>>;
}

#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn find_series(&self, id: Uuid) -> ServiceResult<Option<EventSeries>>;

    async fn overrides_for_series(&self, series_id: Uuid) -> ServiceResult<Vec<EventOverride>>;

    async fn instance_dates(&self, series_id: Uuid) -> ServiceResult<Vec<NaiveDate>>;

    /// Inserts instances, skipping dates that already have one.
    async fn insert_instances(&self, instances: &[NewCalendarEvent]) -> ServiceResult<usize>;

    /// Adds `date` to the exclusion list and deletes its instance atomically.
    /// Returns `false` if the series does not exist.
    async fn exclude_occurrence(&self, series_id: Uuid, date: NaiveDate) -> ServiceResult<bool>;

    /// Upserts the override and reconciles its instance atomically: a
    /// cancellation deletes the instance, otherwise `changes` is applied to it.
    async fn upsert_override(
        &self,
        new_override: &NewEventOverride,
        changes: Option<&InstanceChanges>,
    ) -> ServiceResult<EventOverride>;

    /// Deletes the series, its instances and overrides. Returns `false` if absent.
    async fn delete_series(&self, id: Uuid) -> ServiceResult<bool>;
}

/// Result of promoting a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub series: EventSeries,
    /// `false` when the series already existed from an earlier promotion.
    pub created: bool,
}

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Inserts candidates whose cluster key is new for the owner and returns
    /// only those.
    async fn insert_candidates(&self, candidates: &[NewRecurringCandidate]) -> ServiceResult<Vec<RecurringCandidate>>;

    async fn find_candidate(&self, id: Uuid) -> ServiceResult<Option<RecurringCandidate>>;

    async fn list_candidates(&self, owner_id: Uuid, status: CandidateStatus) -> ServiceResult<Vec<RecurringCandidate>>;

    /// Flips a pending candidate to accepted and creates its series, or
    /// returns the series an earlier promotion created. Atomic.
    ///
    /// Returns `None` if the candidate is neither pending nor accepted.
    async fn promote_candidate(
        &self,
        candidate: &RecurringCandidate,
        series: &NewEventSeries,
    ) -> ServiceResult<Option<Promotion>>;

    /// Flips a pending candidate to rejected. Returns `false` if it was not pending.
    async fn reject_candidate(&self, id: Uuid) -> ServiceResult<bool>;
}
