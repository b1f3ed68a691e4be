use chrono::{NaiveDate, NaiveTime};
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::Serialize;
use uuid::Uuid;

use almanac_core::constants::CANDIDATES_ROUTE_COMPONENT;
use almanac_db::db::enums::CandidateStatus;
use almanac_db::model::candidate::RecurringCandidate;

use super::params::{owner_header, uuid_param};
use super::series::SeriesResponse;
use crate::error::{AppError, AppResult};
use crate::services::get_services_from_depot;

/// ## Summary
/// Recurring candidate payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub cluster_key: String,
    pub pattern: String,
    pub confidence: f64,
    pub title: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub suggested_rrule: String,
    pub occurrence_dates: Vec<NaiveDate>,
    pub source_event_ids: Vec<Uuid>,
    pub status: CandidateStatus,
}

impl From<RecurringCandidate> for CandidateResponse {
    fn from(candidate: RecurringCandidate) -> Self {
        Self {
            id: candidate.id,
            owner_id: candidate.owner_id,
            cluster_key: candidate.cluster_key,
            pattern: candidate.pattern,
            confidence: candidate.confidence,
            title: candidate.title,
            start_time: candidate.start_time,
            end_time: candidate.end_time,
            location: candidate.location,
            suggested_rrule: candidate.suggested_rrule,
            occurrence_dates: candidate.occurrence_dates,
            source_event_ids: candidate.source_event_ids,
            status: candidate.status,
        }
    }
}

/// ## Summary
/// Promotion response payload
#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub series: SeriesResponse,
    pub created: bool,
}

/// Reads `?status=`, defaulting to pending candidates.
fn status_query(req: &Request) -> AppResult<CandidateStatus> {
    req.query::<String>("status").map_or(Ok(CandidateStatus::Pending), |raw| {
        raw.parse::<CandidateStatus>()
            .map_err(|e| AppError::BadRequest(e.to_string()))
    })
}

/// ## Summary
/// GET /api/candidates?status= - Lists the owner's candidates, most confident first.
///
/// ## Errors
/// Returns HTTP 400 if the owner header is missing or the status is unknown
#[handler]
async fn list_candidates(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let owner_id = owner_header(req)?;
        let status = status_query(req)?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.candidates.list(owner_id, status).await?)
    }
    .await;

    match result {
        Ok(candidates) => {
            let body: Vec<CandidateResponse> = candidates.into_iter().map(CandidateResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// POST /api/candidates/detect/{owner_id} - Scans the owner's calendar for weekly patterns.
///
/// Responds with the candidates created by this pass only.
#[handler]
async fn detect_candidates(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let owner_id = uuid_param(req, "owner_id")?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.candidates.detect(owner_id).await?)
    }
    .await;

    match result {
        Ok(created) => {
            let body: Vec<CandidateResponse> = created.into_iter().map(CandidateResponse::from).collect();
            res.render(Json(body));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// POST /api/candidates/{id}/promote - Accepts a candidate and creates its series.
///
/// Promoting an already accepted candidate answers with the existing series
/// and `created: false`.
///
/// ## Errors
/// Returns HTTP 404 for an unknown candidate
/// Returns HTTP 409 for a rejected candidate
#[handler]
async fn promote_candidate(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.candidates.promote(id).await?)
    }
    .await;

    match result {
        Ok(promotion) => {
            if promotion.created {
                res.status_code(StatusCode::CREATED);
            }
            res.render(Json(PromotionResponse {
                series: SeriesResponse::from(promotion.series),
                created: promotion.created,
            }));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// POST /api/candidates/{id}/reject - Marks a pending candidate rejected.
///
/// ## Errors
/// Returns HTTP 404 for an unknown candidate
/// Returns HTTP 409 for an accepted candidate
#[handler]
async fn reject_candidate(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        services.candidates.reject(id).await?;
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

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CANDIDATES_ROUTE_COMPONENT)
        .get(list_candidates)
        .push(Router::with_path("detect/{owner_id}").post(detect_candidates))
        .push(
            Router::with_path("{id}")
                .push(Router::with_path("promote").post(promote_candidate))
                .push(Router::with_path("reject").post(reject_candidate)),
        )
}
