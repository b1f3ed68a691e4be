//! Request parameter parsing shared by the route modules.

use chrono::NaiveDate;
use salvo::Request;
use uuid::Uuid;

use almanac_core::constants::OWNER_HEADER;

use crate::error::{AppError, AppResult};

/// ## Summary
/// Reads a UUID path parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is missing or not a UUID.
pub fn uuid_param(req: &Request, name: &str) -> AppResult<Uuid> {
    let raw = req
        .param::<String>(name)
        .ok_or_else(|| AppError::BadRequest(format!("missing path parameter {name}")))?;
    parse_uuid(name, &raw)
}

/// ## Summary
/// Reads a `YYYY-MM-DD` path parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is missing or not a date.
pub fn date_param(req: &Request, name: &str) -> AppResult<NaiveDate> {
    let raw = req
        .param::<String>(name)
        .ok_or_else(|| AppError::BadRequest(format!("missing path parameter {name}")))?;
    parse_date(name, &raw)
}

/// ## Summary
/// Reads a required `YYYY-MM-DD` query parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is missing or not a date.
pub fn date_query(req: &Request, name: &str) -> AppResult<NaiveDate> {
    let raw = req
        .query::<String>(name)
        .ok_or_else(|| AppError::BadRequest(format!("missing query parameter {name}")))?;
    parse_date(name, &raw)
}

/// ## Summary
/// Reads the owning user from the owner header.
///
/// ## Errors
/// Returns `BadRequest` if the header is missing or not a UUID.
pub fn owner_header(req: &Request) -> AppResult<Uuid> {
    let raw = header_str(req, OWNER_HEADER)
        .ok_or_else(|| AppError::BadRequest(format!("missing {OWNER_HEADER} header")))?;
    parse_uuid(OWNER_HEADER, raw)
}

/// ## Summary
/// Reads an optional boolean query parameter, `false` when absent.
///
/// ## Errors
/// Returns `BadRequest` if the value is not `true`/`false`/`1`/`0`.
pub fn flag_query(req: &Request, name: &str) -> AppResult<bool> {
    req.query::<String>(name).map_or(Ok(false), |raw| parse_flag(name, &raw))
}

/// Returns a header value as text, if present and valid ASCII.
pub fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_uuid(name: &str, raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|e| AppError::BadRequest(format!("{name} is not a valid id: {e}")))
}

pub(crate) fn parse_flag(name: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(AppError::BadRequest(format!("{name} must be true or false, got {other}"))),
    }
}

pub(crate) fn parse_date(name: &str, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("{name} is not a YYYY-MM-DD date: {e}")))
}
