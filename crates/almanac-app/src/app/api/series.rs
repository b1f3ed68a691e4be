use chrono::{NaiveDate, NaiveTime};
use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::Serialize;
use uuid::Uuid;

use almanac_core::constants::SERIES_ROUTE_COMPONENT;
use almanac_db::db::enums::{EventCategory, Priority, SeriesSource};
use almanac_db::model::series::EventSeries;
use almanac_service::series::OverridePatch;

use super::params::{date_param, date_query, uuid_param};
use crate::error::AppError;
use crate::services::get_services_from_depot;

/// ## Summary
/// Event series payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub priority: Priority,
    pub rrule: String,
    pub excluded_dates: Vec<NaiveDate>,
    pub until_date: Option<NaiveDate>,
    pub source: SeriesSource,
    pub is_active: bool,
}

impl From<EventSeries> for SeriesResponse {
    fn from(series: EventSeries) -> Self {
        Self {
            id: series.id,
            owner_id: series.owner_id,
            title: series.title,
            description: series.description,
            start_date: series.start_date,
            start_time: series.start_time,
            end_time: series.end_time,
            duration_minutes: series.duration_minutes,
            location: series.location,
            category: series.category,
            priority: series.priority,
            rrule: series.rrule,
            excluded_dates: series.excluded_dates,
            until_date: series.until_date,
            source: series.source,
            is_active: series.is_active,
        }
    }
}

/// ## Summary
/// Materialization response payload
#[derive(Debug, Serialize)]
pub struct MaterializeResponse {
    pub created: usize,
}

/// ## Summary
/// POST /api/series/{id}/materialize?until=YYYY-MM-DD - Creates missing instances up to `until`.
///
/// ## Errors
/// Returns HTTP 400 if `until` is missing or malformed
/// Returns HTTP 404 for an unknown series
/// Returns HTTP 422 if the series rule cannot be evaluated
#[handler]
async fn materialize_series(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let until = date_query(req, "until")?;
        let services = get_services_from_depot(depot)?;
        Ok::<_, AppError>(services.series.materialize(id, until).await?)
    }
    .await;

    match result {
        Ok(created) => res.render(Json(MaterializeResponse { created })),
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// DELETE /api/series/{id} - Deletes the series with its instances and overrides.
#[handler]
async fn delete_series(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let services = get_services_from_depot(depot)?;
        services.series.delete(id).await?;
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
/// PUT /api/series/{id}/overrides/{date} - Replaces the override for one occurrence.
///
/// The body is an override patch; `"isCancelled": true` removes the
/// occurrence's calendar event.
#[handler]
async fn put_override(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let date = date_param(req, "date")?;
        let patch: OverridePatch = req
            .parse_json()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid override body: {e}")))?;
        let services = get_services_from_depot(depot)?;
        services.series.upsert_override(id, date, patch).await?;
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
/// POST /api/series/{id}/exclusions/{date} - Permanently removes one occurrence.
#[handler]
async fn exclude_occurrence(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = async {
        let id = uuid_param(req, "id")?;
        let date = date_param(req, "date")?;
        let services = get_services_from_depot(depot)?;
        services.series.exclude(id, date).await?;
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
    Router::with_path(SERIES_ROUTE_COMPONENT).push(
        Router::with_path("{id}")
            .delete(delete_series)
            .push(Router::with_path("materialize").post(materialize_series))
            .push(Router::with_path("overrides/{date}").put(put_override))
            .push(Router::with_path("exclusions/{date}").post(exclude_occurrence)),
    )
}
