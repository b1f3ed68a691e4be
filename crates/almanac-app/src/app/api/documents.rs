use chrono::{DateTime, Utc};
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::Serialize;
use uuid::Uuid;

use almanac_core::constants::DOCUMENTS_ROUTE_COMPONENT;
use almanac_db::db::enums::DocumentStatus;
use almanac_db::model::document::Document;
use almanac_service::pipeline::ProcessOutcome;

use super::extracted_events::ExtractedEventResponse;
use super::params::{flag_query, header_str, owner_header, uuid_param};
use crate::error::{AppError, AppResult};
use crate::services::get_services_from_depot;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";
const DEFAULT_FILE_NAME: &str = "upload";

/// ## Summary
/// Document response payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_name: String,
    pub media_type: String,
    pub byte_size: i64,
    pub status: DocumentStatus,
    pub progress: i16,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            owner_id: document.owner_id,
            file_name: document.file_name,
            media_type: document.media_type,
            byte_size: document.byte_size,
            status: document.status,
            progress: document.progress,
            created_at: document.created_at,
        }
    }
}

/// ## Summary
/// POST /api/documents - Stores the raw request body as a new `pending` document.
///
/// The owner comes from the `X-Owner-Id` header, the media type from
/// `Content-Type`, and the optional `name` query parameter names the file.
///
/// ## Errors
/// Returns HTTP 400 if the owner header is missing or malformed
/// Returns HTTP 422 if the body is empty
#[handler]
async fn upload_document(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match upload(req, depot).await {
        Ok(document) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(DocumentResponse::from(document)));
        }
        Err(e) => e.render(res),
    }
}

async fn upload(req: &mut Request, depot: &Depot) -> AppResult<Document> {
    let owner_id = owner_header(req)?;
    let media_type = header_str(req, "Content-Type")
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_string();
    let file_name = req
        .query::<String>("name")
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

    let services = get_services_from_depot(depot)?;
    let body = req
        .payload()
        .await
        .map_err(|e| AppError::BadRequest(format!("failed to read request body: {e}")))?
        .to_vec();

    tracing::debug!(%owner_id, bytes = body.len(), media_type = %media_type, "Upload received");

    Ok(services
        .pipeline
        .upload(owner_id, &file_name, &media_type, &body)
        .await?)
}

/// ## Summary
/// GET /api/documents - Lists the owner's documents, newest first.
///
/// ## Errors
/// Returns HTTP 400 if the owner header is missing or malformed
#[handler]
async fn list_documents(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let owner_id = owner_header(req)?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.pipeline.list(owner_id).await?)
    }
    .await;

    match result {
        Ok(documents) => {
            let body: Vec<DocumentResponse> = documents.into_iter().map(DocumentResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// GET /api/documents/{id}/extracted-events - Lists the events staged for a document.
///
/// `?pending=true` limits the list to events not imported yet.
///
/// ## Errors
/// Returns HTTP 404 for an unknown document
#[handler]
async fn list_extracted_events(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let pending_only = flag_query(req, "pending")?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.pipeline.extracted_events(id, pending_only).await?)
    }
    .await;

    match result {
        Ok(events) => {
            let body: Vec<ExtractedEventResponse> =
                events.into_iter().map(ExtractedEventResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// DELETE /api/documents/{id} - Removes the document, its extracted events and the stored file.
#[handler]
async fn delete_document(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        services.pipeline.delete(id).await?;
        Ok::<_, AppError>(())
    }
    .await;

    match result {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// POST /api/documents/{id}/process - Runs extraction for the document.
///
/// Responds with `{ eventsCount, processingTimeSeconds }` once every batch
/// has been attempted.
///
/// ## Errors
/// Returns HTTP 404 for an unknown document
/// Returns HTTP 409 if another run holds the document
/// Returns HTTP 422 if the document has no usable text
#[handler]
async fn process_document(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        Ok::<ProcessOutcome, AppError>(services.pipeline.process(id).await?)
    }
    .await;

    match result {
        Ok(outcome) => res.render(Json(outcome)),
        Err(e) => e.render(res),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(DOCUMENTS_ROUTE_COMPONENT)
        .get(list_documents)
        .post(upload_document)
        .push(
            Router::with_path("{id}")
                .delete(delete_document)
                .push(Router::with_path("process").post(process_document))
                .push(Router::with_path("extracted-events").get(list_extracted_events)),
        )
}
