//! Promotion of staged extracted events into calendar events.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use almanac_db::db::enums::CalendarSource;
use almanac_db::db::metadata::ExtractionKind;
use almanac_db::model::calendar_event::{CalendarEvent, NewCalendarEvent};
use almanac_db::model::extracted_event::ExtractedEvent;
use almanac_text::date::parse_iso_date;
use almanac_text::expand;

use crate::error::{ServiceError, ServiceResult};
use crate::store::{DocumentRepository, ExtractedEventRepository};

pub struct Importer {
    documents: Arc<dyn DocumentRepository>,
    events: Arc<dyn ExtractedEventRepository>,
}

impl Importer {
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentRepository>, events: Arc<dyn ExtractedEventRepository>) -> Self {
        Self { documents, events }
    }

    /// ## Summary
    /// Imports one extracted event into the owner's calendar.
    ///
    /// A concrete event becomes one calendar event. A deferred range event is
    /// expanded over its weekdays and becomes one calendar event per date.
    /// Every row carries `source = extracted` and the extracted event's id as
    /// `source_id`. The extracted event is marked imported in the same
    /// transaction, so a second import inserts nothing.
    ///
    /// ## Errors
    /// - `NotFound` if the event or its document does not exist.
    /// - `Conflict` if the event was already imported.
    /// - `ValidationError` if a concrete event has no calendar date.
    #[tracing::instrument(skip(self))]
    pub async fn import_event(&self, event_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let event = self
            .events
            .find_extracted(event_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("extracted event {event_id}")))?;
        if event.is_imported {
            return Err(already_imported(event_id));
        }

        let document = self
            .documents
            .find_document(event.document_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("document {}", event.document_id)))?;

        let dates = occurrence_dates(&event)?;
        if dates.is_empty() {
            tracing::warn!(
                line_number = event.metadata.line_number,
                "Range expanded to no dates, marking imported without calendar rows"
            );
        }

        let rows: Vec<NewCalendarEvent> = dates
            .into_iter()
            .map(|date| calendar_row(&event, document.owner_id, date))
            .collect();

        let ids = self
            .events
            .commit_import(event_id, &rows)
            .await?
            .ok_or_else(|| already_imported(event_id))?;

        tracing::info!(created = ids.len(), "Extracted event imported");
        Ok(ids)
    }

    /// ## Summary
    /// Lists the calendar events an import of `event_id` produced, by date.
    ///
    /// ## Errors
    /// Returns `NotFound` if the extracted event does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn imported_events(&self, event_id: Uuid) -> ServiceResult<Vec<CalendarEvent>> {
        if self.events.find_extracted(event_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("extracted event {event_id}")));
        }
        self.events.imported_events(event_id).await
    }
}

fn already_imported(event_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!("extracted event {event_id} was already imported"))
}

fn occurrence_dates(event: &ExtractedEvent) -> ServiceResult<Vec<NaiveDate>> {
    match &event.metadata.kind {
        ExtractionKind::DeferredRange {
            start_date,
            end_date,
            weekdays,
            ..
        } => Ok(expand(*start_date, *end_date, *weekdays)),
        ExtractionKind::Concrete { .. } => {
            let date = parse_iso_date(&event.event_date).map_err(|err| {
                ServiceError::ValidationError(format!(
                    "extracted event {} has no calendar date: {err}",
                    event.id
                ))
            })?;
            Ok(vec![date])
        }
    }
}

fn calendar_row(event: &ExtractedEvent, owner_id: Uuid, date: NaiveDate) -> NewCalendarEvent {
    NewCalendarEvent {
        id: Uuid::now_v7(),
        owner_id,
        title: event.title.clone(),
        description: event.description.clone(),
        event_date: date,
        start_time: event.start_time,
        end_time: event.end_time,
        location: event.location.clone(),
        category: event.category,
        priority: event.priority,
        source: CalendarSource::Extracted,
        source_id: Some(event.id),
        is_completed: false,
        series_id: None,
        occurrence_date: None,
        is_series_instance: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::LineExtraction;
    use crate::materialize::materialize;
    use crate::test_support::MemoryStore;
    use almanac_db::db::enums::DocumentStatus;
    use almanac_db::model::document::NewDocument;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    async fn stage(store: &MemoryStore, owner_id: Uuid, result: &LineExtraction) -> Uuid {
        let document = store
            .insert_document(&NewDocument {
                id: Uuid::now_v7(),
                owner_id,
                file_name: "schedule.txt",
                media_type: "text/plain",
                byte_size: 1,
                storage_key: "key",
                status: DocumentStatus::Completed,
                progress: 100,
            })
            .await
            .expect("document");
        let event = materialize(document.id, result).expect("materialized");
        store.insert_extracted(&[event.clone()]).await.expect("insert");
        event.id
    }

    fn importer(store: &Arc<MemoryStore>) -> Importer {
        Importer::new(store.clone(), store.clone())
    }

    #[test_log::test(tokio::test)]
    async fn test_deferred_range_round_trip() {
        let store = Arc::new(MemoryStore::default());
        let owner = Uuid::now_v7();
        let event_id = stage(
            &store,
            owner,
            &LineExtraction {
                line_number: 4,
                event: "Soccer practice".to_string(),
                date_text: Some("Mondays, Nov 3 - Nov 17".to_string()),
                normalized_date: Some("2025-11-03".to_string()),
                normalized_end_date: Some("2025-11-17".to_string()),
                day_of_week: Some("Monday".to_string()),
                is_range_with_day: true,
                start_time: Some("16:00".to_string()),
                location: Some("Field 2".to_string()),
                ..LineExtraction::default()
            },
        )
        .await;

        let ids = importer(&store).import_event(event_id).await.expect("import");
        assert_eq!(ids.len(), 3);

        let listed: Vec<Uuid> = importer(&store)
            .imported_events(event_id)
            .await
            .expect("list")
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(listed, ids);

        let events = store.calendar_events();
        let dates: Vec<NaiveDate> = events.iter().map(|e| e.event_date).collect();
        assert_eq!(dates, vec![date(2025, 11, 3), date(2025, 11, 10), date(2025, 11, 17)]);
        for event in &events {
            assert_eq!(event.source_id, Some(event_id));
            assert_eq!(event.source, CalendarSource::Extracted);
            assert_eq!(event.owner_id, owner);
            assert_eq!(event.title, "Soccer practice");
            assert_eq!(event.start_time, NaiveTime::from_hms_opt(16, 0, 0));
            assert_eq!(event.location.as_deref(), Some("Field 2"));
            assert!(event.series_id.is_none());
        }

        let imported: Vec<bool> = store
            .extracted_events()
            .iter()
            .filter(|e| e.id == event_id)
            .map(|e| e.is_imported)
            .collect();
        assert_eq!(imported, vec![true]);

        assert!(matches!(
            importer(&store).import_event(event_id).await,
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(store.calendar_events().len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_concrete_event_imports_once() {
        let store = Arc::new(MemoryStore::default());
        let event_id = stage(
            &store,
            Uuid::now_v7(),
            &LineExtraction {
                line_number: 2,
                event: "Midterm".to_string(),
                normalized_date: Some("2025-11-05".to_string()),
                category: Some("exam".to_string()),
                ..LineExtraction::default()
            },
        )
        .await;

        let ids = importer(&store).import_event(event_id).await.expect("import");
        assert_eq!(ids.len(), 1);

        let events = store.calendar_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, ids[0]);
        assert_eq!(events[0].event_date, date(2025, 11, 5));
    }

    #[test_log::test(tokio::test)]
    async fn test_unrecognized_weekday_imports_no_occurrences() {
        let store = Arc::new(MemoryStore::default());
        let event_id = stage(
            &store,
            Uuid::now_v7(),
            &LineExtraction {
                line_number: 9,
                event: "Lab hours".to_string(),
                normalized_date: Some("2025-11-03".to_string()),
                normalized_end_date: Some("2025-11-17".to_string()),
                day_of_week: Some("every other day".to_string()),
                is_range_with_day: true,
                ..LineExtraction::default()
            },
        )
        .await;

        let ids = importer(&store).import_event(event_id).await.expect("import");
        assert!(ids.is_empty());
        assert!(store.calendar_events().is_empty());
        assert!(store.extracted_events().iter().all(|e| e.is_imported));
    }

    #[test_log::test(tokio::test)]
    async fn test_raw_date_text_cannot_be_imported() {
        let store = Arc::new(MemoryStore::default());
        let event_id = stage(
            &store,
            Uuid::now_v7(),
            &LineExtraction {
                line_number: 7,
                event: "Book fair".to_string(),
                date_text: Some("early March".to_string()),
                ..LineExtraction::default()
            },
        )
        .await;

        assert!(matches!(
            importer(&store).import_event(event_id).await,
            Err(ServiceError::ValidationError(_))
        ));
        assert!(store.calendar_events().is_empty());
        assert!(store.extracted_events().iter().all(|e| !e.is_imported));
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_event() {
        let store = Arc::new(MemoryStore::default());
        assert!(matches!(
            importer(&store).imported_events(Uuid::now_v7()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            importer(&store).import_event(Uuid::now_v7()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
