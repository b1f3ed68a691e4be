use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::Serialize;
use uuid::Uuid;

use almanac_core::constants::EXTRACTED_EVENTS_ROUTE_COMPONENT;
use almanac_db::db::enums::{CalendarSource, EventCategory, Priority};
use almanac_db::db::metadata::ExtractionMetadata;
use almanac_db::model::calendar_event::CalendarEvent;
use almanac_db::model::extracted_event::ExtractedEvent;

use super::params::uuid_param;
use crate::error::AppError;
use crate::services::get_services_from_depot;

/// ## Summary
/// Staged extracted event payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEventResponse {
    pub id: Uuid,
    pub document_id: Uuid,
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
    pub created_at: DateTime<Utc>,
}

impl From<ExtractedEvent> for ExtractedEventResponse {
    fn from(event: ExtractedEvent) -> Self {
        Self {
            id: event.id,
            document_id: event.document_id,
            title: event.title,
            description: event.description,
            event_date: event.event_date,
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location,
            category: event.category,
            priority: event.priority,
            confidence: event.confidence,
            is_imported: event.is_imported,
            metadata: event.metadata,
            created_at: event.created_at,
        }
    }
}

/// ## Summary
/// Calendar event payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub priority: Priority,
    pub source: CalendarSource,
    pub source_id: Option<Uuid>,
    pub is_completed: bool,
}

impl From<CalendarEvent> for CalendarEventResponse {
    fn from(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            owner_id: event.owner_id,
            title: event.title,
            description: event.description,
            event_date: event.event_date,
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location,
            category: event.category,
            priority: event.priority,
            source: event.source,
            source_id: event.source_id,
            is_completed: event.is_completed,
        }
    }
}

/// ## Summary
/// Import response payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub calendar_event_ids: Vec<Uuid>,
}

/// ## Summary
/// POST /api/extracted-events/{id}/import - Copies a staged event into the calendar.
///
/// ## Errors
/// Returns HTTP 404 if the extracted event does not exist
/// Returns HTTP 409 if it was already imported
/// Returns HTTP 422 if it carries no usable date
#[handler]
async fn import_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.importer.import_event(id).await?)
    }
    .await;

    match result {
        Ok(calendar_event_ids) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(ImportResponse { calendar_event_ids }));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// GET /api/extracted-events/{id}/calendar-events - Lists the calendar events an import created.
///
/// ## Errors
/// Returns HTTP 404 if the extracted event does not exist
#[handler]
async fn list_calendar_events(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.importer.imported_events(id).await?)
    }
    .await;

    match result {
        Ok(events) => {
            let body: Vec<CalendarEventResponse> =
                events.into_iter().map(CalendarEventResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => e.render(res),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(EXTRACTED_EVENTS_ROUTE_COMPONENT).push(
        Router::with_path("{id}")
            .push(Router::with_path("import").post(import_event))
            .push(Router::with_path("calendar-events").get(list_calendar_events)),
    )
}
