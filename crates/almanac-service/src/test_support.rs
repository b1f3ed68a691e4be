//! In-memory collaborators for service tests.
//!
//! `MemoryStore` mirrors the Postgres repository semantics (unique keys,
//! conditional transitions, cascades) closely enough that service logic can
//! be exercised without a database.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use almanac_db::db::enums::{CandidateStatus, DocumentStatus};
use almanac_db::model::calendar_event::{CalendarEvent, InstanceChanges, NewCalendarEvent};
use almanac_db::model::candidate::{NewRecurringCandidate, RecurringCandidate};
use almanac_db::model::document::{Document, NewDocument};
use almanac_db::model::extracted_event::{ExtractedEvent, NewExtractedEvent};
use almanac_db::model::series::{EventOverride, EventSeries, NewEventOverride, NewEventSeries};

use crate::error::{CompletionError, ServiceError, ServiceResult};
use crate::extraction::{BatchRequest, CompletionClient};
use crate::storage::ObjectStorage;
use crate::store::{
    CalendarRepository, CandidateRepository, DocumentRepository, ExtractedEventRepository,
    Promotion, SeriesRepository,
};

/// Replays canned completion responses in order; answers with an empty
/// result set once the script runs out.
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<BatchRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<BatchRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &BatchRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("lock").push(request.clone());
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"events": []}"#.to_string()))
    }
}

#[derive(Default)]
pub(crate) struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.objects.lock().expect("lock").contains_key(key)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn download(&self, key: &str) -> ServiceResult<Vec<u8>> {
        self.objects
            .lock()
            .expect("lock")
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("storage object {key}")))
    }

    async fn upload(&self, key: &str, bytes: &[u8]) -> ServiceResult<String> {
        self.objects
            .lock()
            .expect("lock")
            .insert(key.to_string(), bytes.to_vec());
        Ok(key.to_string())
    }

    async fn remove(&self, key: &str) -> ServiceResult<()> {
        self.objects.lock().expect("lock").remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct State {
    documents: HashMap<Uuid, Document>,
    extracted: Vec<ExtractedEvent>,
    calendar: Vec<CalendarEvent>,
    series: Vec<EventSeries>,
    overrides: Vec<EventOverride>,
    candidates: Vec<RecurringCandidate>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub(crate) fn document(&self, id: Uuid) -> Option<Document> {
        self.state.lock().expect("lock").documents.get(&id).cloned()
    }

    pub(crate) fn extracted_events(&self) -> Vec<ExtractedEvent> {
        self.state.lock().expect("lock").extracted.clone()
    }

    pub(crate) fn calendar_events(&self) -> Vec<CalendarEvent> {
        self.state.lock().expect("lock").calendar.clone()
    }

    pub(crate) fn all_series(&self) -> Vec<EventSeries> {
        self.state.lock().expect("lock").series.clone()
    }

    pub(crate) fn candidates(&self) -> Vec<RecurringCandidate> {
        self.state.lock().expect("lock").candidates.clone()
    }

    pub(crate) fn overrides(&self) -> Vec<EventOverride> {
        self.state.lock().expect("lock").overrides.clone()
    }

    pub(crate) fn put_document(&self, document: Document) {
        self.state
            .lock()
            .expect("lock")
            .documents
            .insert(document.id, document);
    }

    pub(crate) fn put_calendar_event(&self, event: &NewCalendarEvent) {
        self.state.lock().expect("lock").calendar.push(calendar_row(event));
    }

    pub(crate) fn put_series(&self, series: &NewEventSeries) -> EventSeries {
        let row = series_row(series);
        self.state.lock().expect("lock").series.push(row.clone());
        row
    }
}

fn calendar_row(new: &NewCalendarEvent) -> CalendarEvent {
    let now = Utc::now();
    CalendarEvent {
        id: new.id,
        owner_id: new.owner_id,
        title: new.title.clone(),
        description: new.description.clone(),
        event_date: new.event_date,
        start_time: new.start_time,
        end_time: new.end_time,
        location: new.location.clone(),
        category: new.category,
        priority: new.priority,
        source: new.source,
        source_id: new.source_id,
        is_completed: new.is_completed,
        series_id: new.series_id,
        occurrence_date: new.occurrence_date,
        is_series_instance: new.is_series_instance,
        created_at: now,
        updated_at: now,
    }
}

fn series_row(new: &NewEventSeries) -> EventSeries {
    let now = Utc::now();
    EventSeries {
        id: new.id,
        owner_id: new.owner_id,
        title: new.title.clone(),
        normalized_title: new.normalized_title.clone(),
        description: new.description.clone(),
        start_date: new.start_date,
        start_time: new.start_time,
        end_time: new.end_time,
        duration_minutes: new.duration_minutes,
        location: new.location.clone(),
        category: new.category,
        priority: new.priority,
        rrule: new.rrule.clone(),
        excluded_dates: new.excluded_dates.clone(),
        until_date: new.until_date,
        source: new.source,
        source_cluster_key: new.source_cluster_key.clone(),
        is_active: new.is_active,
        created_at: now,
        updated_at: now,
    }
}

fn is_instance(event: &CalendarEvent, series_id: Uuid, date: NaiveDate) -> bool {
    event.series_id == Some(series_id) && event.occurrence_date == Some(date)
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn insert_document(&self, new: &NewDocument<'_>) -> ServiceResult<Document> {
        let now = Utc::now();
        let row = Document {
            id: new.id,
            owner_id: new.owner_id,
            file_name: new.file_name.to_string(),
            media_type: new.media_type.to_string(),
            byte_size: new.byte_size,
            storage_key: new.storage_key.to_string(),
            status: new.status,
            progress: new.progress,
            extracted_text: None,
            processing_time_secs: None,
            error_message: None,
            processing_started_at: None,
            created_at: now,
            updated_at: now,
        };
        self.put_document(row.clone());
        Ok(row)
    }

    async fn find_document(&self, id: Uuid) -> ServiceResult<Option<Document>> {
        Ok(self.document(id))
    }

    async fn list_documents(&self, owner_id: Uuid) -> ServiceResult<Vec<Document>> {
        let state = self.state.lock().expect("lock");
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|doc| doc.owner_id == owner_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(documents)
    }

    async fn claim_document(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> ServiceResult<Option<Document>> {
        let mut state = self.state.lock().expect("lock");
        let Some(doc) = state.documents.get_mut(&id) else {
            return Ok(None);
        };

        let held = doc.status == DocumentStatus::Processing
            && doc.processing_started_at.is_some_and(|started| started >= stale_before);
        if held {
            return Ok(None);
        }

        doc.status = DocumentStatus::Processing;
        doc.progress = 0;
        doc.error_message = None;
        doc.processing_started_at = Some(now);
        doc.updated_at = now;
        let claimed = doc.clone();

        state
            .extracted
            .retain(|event| event.document_id != id || event.is_imported);
        Ok(Some(claimed))
    }

    async fn advance_progress(&self, id: Uuid, progress: i16) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("lock");
        if let Some(doc) = state.documents.get_mut(&id)
            && doc.progress < progress
        {
            doc.progress = progress;
        }
        Ok(())
    }

    async fn set_extracted_text(&self, id: Uuid, excerpt: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("lock");
        if let Some(doc) = state.documents.get_mut(&id) {
            doc.extracted_text = Some(excerpt.to_string());
        }
        Ok(())
    }

    async fn complete_document(&self, id: Uuid, processing_time_secs: f64) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("lock");
        if let Some(doc) = state.documents.get_mut(&id) {
            doc.status = DocumentStatus::Completed;
            doc.progress = 100;
            doc.processing_time_secs = Some(processing_time_secs);
            doc.error_message = None;
        }
        Ok(())
    }

    async fn fail_document(&self, id: Uuid, message: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().expect("lock");
        if let Some(doc) = state.documents.get_mut(&id) {
            doc.status = DocumentStatus::Error;
            doc.error_message = Some(message.to_string());
        }
        Ok(())
    }

    async fn delete_document(&self, id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().expect("lock");
        let existed = state.documents.remove(&id).is_some();
        state.extracted.retain(|event| event.document_id != id);
        Ok(existed)
    }
}

#[async_trait]
impl ExtractedEventRepository for MemoryStore {
    async fn insert_extracted(&self, events: &[NewExtractedEvent]) -> ServiceResult<usize> {
        let mut state = self.state.lock().expect("lock");
        let now = Utc::now();
        state.extracted.extend(events.iter().map(|new| ExtractedEvent {
            id: new.id,
            document_id: new.document_id,
            title: new.title.clone(),
            description: new.description.clone(),
            event_date: new.event_date.clone(),
            start_time: new.start_time,
            end_time: new.end_time,
            location: new.location.clone(),
            category: new.category,
            priority: new.priority,
            confidence: new.confidence,
            is_imported: false,
            metadata: new.metadata.clone(),
            created_at: now,
        }));
        Ok(events.len())
    }

    async fn find_extracted(&self, id: Uuid) -> ServiceResult<Option<ExtractedEvent>> {
        let state = self.state.lock().expect("lock");
        Ok(state.extracted.iter().find(|event| event.id == id).cloned())
    }

    async fn list_extracted(&self, document_id: Uuid, pending_only: bool) -> ServiceResult<Vec<ExtractedEvent>> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .extracted
            .iter()
            .filter(|event| event.document_id == document_id)
            .filter(|event| !pending_only || !event.is_imported)
            .cloned()
            .collect())
    }

    async fn imported_events(&self, event_id: Uuid) -> ServiceResult<Vec<CalendarEvent>> {
        let state = self.state.lock().expect("lock");
        let mut events: Vec<CalendarEvent> = state
            .calendar
            .iter()
            .filter(|event| event.source_id == Some(event_id))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.event_date);
        Ok(events)
    }

    async fn commit_import(&self, event_id: Uuid, rows: &[NewCalendarEvent]) -> ServiceResult<Option<Vec<Uuid>>> {
        let mut state = self.state.lock().expect("lock");
        let Some(event) = state
            .extracted
            .iter_mut()
            .find(|event| event.id == event_id && !event.is_imported)
        else {
            return Ok(None);
        };
        event.is_imported = true;

        state.calendar.extend(rows.iter().map(calendar_row));
        Ok(Some(rows.iter().map(|row| row.id).collect()))
    }
}

#[async_trait]
impl CalendarRepository for MemoryStore {
    async fn unlinked_events(&self, owner_id: Uuid) -> ServiceResult<Vec<CalendarEvent>> {
        let state = self.state.lock().expect("lock");
        let mut events: Vec<CalendarEvent> = state
            .calendar
            .iter()
            .filter(|event| event.owner_id == owner_id && event.series_id.is_none())
            .cloned()
            .collect();
        events.sort_by_key(|event| event.event_date);
        Ok(events)
    }
}

#[async_trait]
impl SeriesRepository for MemoryStore {
    async fn find_series(&self, id: Uuid) -> ServiceResult<Option<EventSeries>> {
        let state = self.state.lock().expect("lock");
        Ok(state.series.iter().find(|series| series.id == id).cloned())
    }

    async fn overrides_for_series(&self, series_id: Uuid) -> ServiceResult<Vec<EventOverride>> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .overrides
            .iter()
            .filter(|o| o.series_id == series_id)
            .cloned()
            .collect())
    }

    async fn instance_dates(&self, series_id: Uuid) -> ServiceResult<Vec<NaiveDate>> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .calendar
            .iter()
            .filter(|event| event.series_id == Some(series_id))
            .filter_map(|event| event.occurrence_date)
            .collect())
    }

    async fn insert_instances(&self, instances: &[NewCalendarEvent]) -> ServiceResult<usize> {
        let mut state = self.state.lock().expect("lock");
        let mut inserted = 0;
        for instance in instances {
            let (Some(series_id), Some(date)) = (instance.series_id, instance.occurrence_date) else {
                continue;
            };
            if state.calendar.iter().any(|event| is_instance(event, series_id, date)) {
                continue;
            }
            state.calendar.push(calendar_row(instance));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn exclude_occurrence(&self, series_id: Uuid, date: NaiveDate) -> ServiceResult<bool> {
        let mut state = self.state.lock().expect("lock");
        let Some(series) = state.series.iter_mut().find(|series| series.id == series_id) else {
            return Ok(false);
        };
        if !series.excluded_dates.contains(&date) {
            series.excluded_dates.push(date);
            series.excluded_dates.sort_unstable();
        }
        state.calendar.retain(|event| !is_instance(event, series_id, date));
        Ok(true)
    }

    async fn upsert_override(
        &self,
        new: &NewEventOverride,
        changes: Option<&InstanceChanges>,
    ) -> ServiceResult<EventOverride> {
        let mut state = self.state.lock().expect("lock");
        let now = Utc::now();

        let existing = state
            .overrides
            .iter()
            .position(|o| o.series_id == new.series_id && o.occurrence_date == new.occurrence_date);
        let (id, created_at) = existing
            .map(|idx| (state.overrides[idx].id, state.overrides[idx].created_at))
            .unwrap_or((new.id, now));
        let saved = EventOverride {
            id,
            series_id: new.series_id,
            occurrence_date: new.occurrence_date,
            title: new.title.clone(),
            description: new.description.clone(),
            start_time: new.start_time,
            end_time: new.end_time,
            location: new.location.clone(),
            is_cancelled: new.is_cancelled,
            is_completed: new.is_completed,
            created_at,
            updated_at: now,
        };
        match existing {
            Some(idx) => state.overrides[idx] = saved.clone(),
            None => state.overrides.push(saved.clone()),
        }

        if saved.is_cancelled {
            state
                .calendar
                .retain(|event| !is_instance(event, saved.series_id, saved.occurrence_date));
        } else if let Some(changes) = changes {
            for event in state
                .calendar
                .iter_mut()
                .filter(|event| is_instance(event, saved.series_id, saved.occurrence_date))
            {
                event.title = changes.title.clone();
                event.description = changes.description.clone();
                event.start_time = changes.start_time;
                event.end_time = changes.end_time;
                event.location = changes.location.clone();
                event.is_completed = changes.is_completed;
            }
        }

        Ok(saved)
    }

    async fn delete_series(&self, id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().expect("lock");
        let before = state.series.len();
        state.series.retain(|series| series.id != id);
        if state.series.len() == before {
            return Ok(false);
        }
        state.calendar.retain(|event| event.series_id != Some(id));
        state.overrides.retain(|o| o.series_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CandidateRepository for MemoryStore {
    async fn insert_candidates(&self, candidates: &[NewRecurringCandidate]) -> ServiceResult<Vec<RecurringCandidate>> {
        let mut state = self.state.lock().expect("lock");
        let now = Utc::now();
        let mut inserted = Vec::new();

        for new in candidates {
            let taken = state
                .candidates
                .iter()
                .any(|c| c.owner_id == new.owner_id && c.cluster_key == new.cluster_key);
            if taken {
                continue;
            }
            let row = RecurringCandidate {
                id: new.id,
                owner_id: new.owner_id,
                cluster_key: new.cluster_key.clone(),
                source_event_ids: new.source_event_ids.clone(),
                pattern: new.pattern.clone(),
                confidence: new.confidence,
                title: new.title.clone(),
                normalized_title: new.normalized_title.clone(),
                start_time: new.start_time,
                end_time: new.end_time,
                location: new.location.clone(),
                suggested_rrule: new.suggested_rrule.clone(),
                occurrence_dates: new.occurrence_dates.clone(),
                status: new.status,
                created_at: now,
                updated_at: now,
            };
            state.candidates.push(row.clone());
            inserted.push(row);
        }

        Ok(inserted)
    }

    async fn find_candidate(&self, id: Uuid) -> ServiceResult<Option<RecurringCandidate>> {
        let state = self.state.lock().expect("lock");
        Ok(state.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn list_candidates(&self, owner_id: Uuid, status: CandidateStatus) -> ServiceResult<Vec<RecurringCandidate>> {
        let state = self.state.lock().expect("lock");
        let mut candidates: Vec<RecurringCandidate> = state
            .candidates
            .iter()
            .filter(|c| c.owner_id == owner_id && c.status == status)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(candidates)
    }

    async fn promote_candidate(
        &self,
        candidate: &RecurringCandidate,
        new_series: &NewEventSeries,
    ) -> ServiceResult<Option<Promotion>> {
        let mut state = self.state.lock().expect("lock");
        let Some(current) = state.candidates.iter_mut().find(|c| c.id == candidate.id) else {
            return Ok(None);
        };

        match current.status {
            CandidateStatus::Rejected => return Ok(None),
            CandidateStatus::Pending => current.status = CandidateStatus::Accepted,
            CandidateStatus::Accepted => {}
        }

        let existing = state
            .series
            .iter()
            .find(|series| {
                series.owner_id == candidate.owner_id
                    && series.source_cluster_key.as_deref() == Some(candidate.cluster_key.as_str())
            })
            .cloned();
        if let Some(series) = existing {
            return Ok(Some(Promotion {
                series,
                created: false,
            }));
        }

        let series = series_row(new_series);
        state.series.push(series.clone());
        Ok(Some(Promotion {
            series,
            created: true,
        }))
    }

    async fn reject_candidate(&self, id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().expect("lock");
        match state
            .candidates
            .iter_mut()
            .find(|c| c.id == id && c.status == CandidateStatus::Pending)
        {
            Some(candidate) => {
                candidate.status = CandidateStatus::Rejected;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
