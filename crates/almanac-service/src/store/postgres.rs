//! Repository implementation over the Postgres connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use uuid::Uuid;

use almanac_db::db::DbProvider;
use almanac_db::db::connection::DbConnection;
use almanac_db::db::enums::CandidateStatus;
use almanac_db::db::query::{
    calendar_event, candidate, document, event_override, extracted_event, series,
};
use almanac_db::db::transaction::with_transaction;
use almanac_db::model::calendar_event::{CalendarEvent, InstanceChanges, NewCalendarEvent};
use almanac_db::model::candidate::{NewRecurringCandidate, RecurringCandidate};
use almanac_db::model::document::{Document, NewDocument};
use almanac_db::model::extracted_event::{ExtractedEvent, NewExtractedEvent};
use almanac_db::model::series::{EventOverride, EventSeries, NewEventOverride, NewEventSeries};

use super::{
    CalendarRepository, CandidateRepository, DocumentRepository, ExtractedEventRepository,
    Promotion, SeriesRepository,
};
use crate::error::{ServiceError, ServiceResult};

/// Repositories backed by the shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    provider: Arc<dyn DbProvider + Send + Sync>,
}

impl PgStore {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider + Send + Sync>) -> Self {
        Self { provider }
    }

    async fn conn(&self) -> ServiceResult<DbConnection<'_>> {
        Ok(self.provider.get_connection().await?)
    }
}

#[async_trait]
impl DocumentRepository for PgStore {
    async fn insert_document(&self, new_document: &NewDocument<'_>) -> ServiceResult<Document> {
        let mut conn = self.conn().await?;
        Ok(document::insert(&mut conn, new_document).await?)
    }

    async fn find_document(&self, id: Uuid) -> ServiceResult<Option<Document>> {
        let mut conn = self.conn().await?;
        Ok(document::find(&mut conn, id).await?)
    }

    async fn list_documents(&self, owner_id: Uuid) -> ServiceResult<Vec<Document>> {
        let mut conn = self.conn().await?;
        Ok(document::list_for_owner(&mut conn, owner_id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn claim_document(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> ServiceResult<Option<Document>> {
        let mut conn = self.conn().await?;
        with_transaction(&mut conn, |tx| {
            async move {
                let Some(claimed) = document::claim(tx, id, now, stale_before).await? else {
                    return Ok(None);
                };
                let discarded = extracted_event::delete_pending(tx, id).await?;
                if discarded > 0 {
                    tracing::debug!(discarded, "Discarded events staged by an earlier run");
                }
                Ok::<_, ServiceError>(Some(claimed))
            }
            .scope_boxed()
        })
        .await
    }

    async fn advance_progress(&self, id: Uuid, progress: i16) -> ServiceResult<()> {
        let mut conn = self.conn().await?;
        document::advance_progress(&mut conn, id, progress).await?;
        Ok(())
    }

    async fn set_extracted_text(&self, id: Uuid, excerpt: &str) -> ServiceResult<()> {
        let mut conn = self.conn().await?;
        document::set_extracted_text(&mut conn, id, excerpt).await?;
        Ok(())
    }

    async fn complete_document(&self, id: Uuid, processing_time_secs: f64) -> ServiceResult<()> {
        let mut conn = self.conn().await?;
        document::complete(&mut conn, id, processing_time_secs).await?;
        Ok(())
    }

    async fn fail_document(&self, id: Uuid, message: &str) -> ServiceResult<()> {
        let mut conn = self.conn().await?;
        document::fail(&mut conn, id, message).await?;
        Ok(())
    }

    async fn delete_document(&self, id: Uuid) -> ServiceResult<bool> {
        let mut conn = self.conn().await?;
        Ok(document::delete(&mut conn, id).await? > 0)
    }
}

#[async_trait]
impl ExtractedEventRepository for PgStore {
    async fn insert_extracted(&self, events: &[NewExtractedEvent]) -> ServiceResult<usize> {
        let mut conn = self.conn().await?;
        Ok(extracted_event::insert_batch(&mut conn, events).await?)
    }

    async fn find_extracted(&self, id: Uuid) -> ServiceResult<Option<ExtractedEvent>> {
        let mut conn = self.conn().await?;
        Ok(extracted_event::find(&mut conn, id).await?)
    }

    async fn list_extracted(&self, document_id: Uuid, pending_only: bool) -> ServiceResult<Vec<ExtractedEvent>> {
        let mut conn = self.conn().await?;
        Ok(extracted_event::load_for_document(&mut conn, document_id, pending_only).await?)
    }

    async fn imported_events(&self, event_id: Uuid) -> ServiceResult<Vec<CalendarEvent>> {
        let mut conn = self.conn().await?;
        Ok(calendar_event::load_from_source(&mut conn, event_id).await?)
    }

    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn commit_import(&self, event_id: Uuid, rows: &[NewCalendarEvent]) -> ServiceResult<Option<Vec<Uuid>>> {
        let mut conn = self.conn().await?;
        with_transaction(&mut conn, |tx| {
            async move {
                if extracted_event::mark_imported(tx, event_id).await? == 0 {
                    return Ok(None);
                }
                let ids = calendar_event::insert_batch(tx, rows).await?;
                Ok::<_, ServiceError>(Some(ids))
            }
            .scope_boxed()
        })
        .await
    }
}

#[async_trait]
impl CalendarRepository for PgStore {
    async fn unlinked_events(&self, owner_id: Uuid) -> ServiceResult<Vec<CalendarEvent>> {
        let mut conn = self.conn().await?;
        Ok(calendar_event::load_unlinked(&mut conn, owner_id).await?)
    }
}

#[async_trait]
impl SeriesRepository for PgStore {
    async fn find_series(&self, id: Uuid) -> ServiceResult<Option<EventSeries>> {
        let mut conn = self.conn().await?;
        Ok(series::find(&mut conn, id).await?)
    }

    async fn overrides_for_series(&self, series_id: Uuid) -> ServiceResult<Vec<EventOverride>> {
        let mut conn = self.conn().await?;
        Ok(event_override::load_for_series(&mut conn, series_id).await?)
    }

    async fn instance_dates(&self, series_id: Uuid) -> ServiceResult<Vec<NaiveDate>> {
        let mut conn = self.conn().await?;
        Ok(calendar_event::instance_dates(&mut conn, series_id).await?)
    }

    async fn insert_instances(&self, instances: &[NewCalendarEvent]) -> ServiceResult<usize> {
        let mut conn = self.conn().await?;
        Ok(calendar_event::insert_instances(&mut conn, instances).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn exclude_occurrence(&self, series_id: Uuid, date: NaiveDate) -> ServiceResult<bool> {
        let mut conn = self.conn().await?;
        with_transaction(&mut conn, |tx| {
            async move {
                let Some(existing) = series::find_for_update(tx, series_id).await? else {
                    return Ok(false);
                };

                let mut excluded = existing.excluded_dates;
                if !excluded.contains(&date) {
                    excluded.push(date);
                    excluded.sort_unstable();
                    series::set_excluded_dates(tx, series_id, &excluded).await?;
                }
                calendar_event::delete_instance(tx, series_id, date).await?;

                Ok::<_, ServiceError>(true)
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, new_override, changes), fields(series_id = %new_override.series_id, date = %new_override.occurrence_date))]
    async fn upsert_override(
        &self,
        new_override: &NewEventOverride,
        changes: Option<&InstanceChanges>,
    ) -> ServiceResult<EventOverride> {
        let mut conn = self.conn().await?;
        with_transaction(&mut conn, |tx| {
            async move {
                let saved = event_override::upsert(tx, new_override).await?;
                if saved.is_cancelled {
                    calendar_event::delete_instance(tx, saved.series_id, saved.occurrence_date).await?;
                } else if let Some(changes) = changes {
                    calendar_event::update_instance(tx, saved.series_id, saved.occurrence_date, changes)
                        .await?;
                }
                Ok::<_, ServiceError>(saved)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete_series(&self, id: Uuid) -> ServiceResult<bool> {
        let mut conn = self.conn().await?;
        Ok(series::delete(&mut conn, id).await? > 0)
    }
}

#[async_trait]
impl CandidateRepository for PgStore {
    async fn insert_candidates(&self, candidates: &[NewRecurringCandidate]) -> ServiceResult<Vec<RecurringCandidate>> {
        let mut conn = self.conn().await?;
        Ok(candidate::insert_new(&mut conn, candidates).await?)
    }

    async fn find_candidate(&self, id: Uuid) -> ServiceResult<Option<RecurringCandidate>> {
        let mut conn = self.conn().await?;
        Ok(candidate::find(&mut conn, id).await?)
    }

    async fn list_candidates(&self, owner_id: Uuid, status: CandidateStatus) -> ServiceResult<Vec<RecurringCandidate>> {
        let mut conn = self.conn().await?;
        Ok(candidate::load_for_owner(&mut conn, owner_id, status).await?)
    }

    #[tracing::instrument(skip(self, pending, new_series), fields(candidate_id = %pending.id))]
    async fn promote_candidate(
        &self,
        pending: &RecurringCandidate,
        new_series: &NewEventSeries,
    ) -> ServiceResult<Option<Promotion>> {
        let mut conn = self.conn().await?;
        with_transaction(&mut conn, |tx| {
            async move {
                let moved = candidate::transition(
                    tx,
                    pending.id,
                    CandidateStatus::Pending,
                    CandidateStatus::Accepted,
                )
                .await?;

                if moved == 1 {
                    if let Some(created) = series::insert_if_absent(tx, new_series).await? {
                        return Ok(Some(Promotion {
                            series: created,
                            created: true,
                        }));
                    }
                } else {
                    let current = candidate::find(tx, pending.id).await?;
                    if current.map(|c| c.status) != Some(CandidateStatus::Accepted) {
                        return Ok(None);
                    }
                }

                let existing =
                    series::find_by_cluster_key(tx, pending.owner_id, &pending.cluster_key).await?;
                Ok::<_, ServiceError>(existing.map(|series| Promotion {
                    series,
                    created: false,
                }))
            }
            .scope_boxed()
        })
        .await
    }

    async fn reject_candidate(&self, id: Uuid) -> ServiceResult<bool> {
        let mut conn = self.conn().await?;
        let moved =
            candidate::transition(&mut conn, id, CandidateStatus::Pending, CandidateStatus::Rejected)
                .await?;
        Ok(moved > 0)
    }
}
