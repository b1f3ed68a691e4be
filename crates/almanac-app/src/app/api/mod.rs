mod app_specific;
mod candidates;
mod documents;
mod extracted_events;
mod params;
mod series;

use salvo::Router;

pub use almanac_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, CANDIDATES_ROUTE_COMPONENT, DOCUMENTS_ROUTE_COMPONENT,
    DOCUMENTS_ROUTE_PREFIX, EXTRACTED_EVENTS_ROUTE_COMPONENT, SERIES_ROUTE_COMPONENT,
};

/// ## Summary
/// Constructs the main API router.
///
/// ## Errors
/// Returns an error if any child route handler fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::with_path(API_ROUTE_COMPONENT)
        .push(app_specific::routes())
        .push(documents::routes())
        .push(extracted_events::routes())
        .push(candidates::routes())
        .push(series::routes()))
}
