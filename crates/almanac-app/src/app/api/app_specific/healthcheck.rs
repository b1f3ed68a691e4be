use salvo::{Depot, Response, Router, handler, http::StatusCode};

use crate::services::get_services_from_depot;

/// ## Summary
/// GET /api/app/healthcheck - `OK` once a database connection can be checked out.
#[handler]
async fn healthcheck(depot: &mut Depot, res: &mut Response) {
    let services = match get_services_from_depot(depot) {
        Ok(services) => services,
        Err(e) => {
            tracing::error!(error = %e, "Healthcheck without services");
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);
            res.render("UNAVAILABLE");
            return;
        }
    };

    if let Err(e) = services.provider.get_connection().await {
        tracing::warn!(error = %e, "Healthcheck could not reach the database");
        res.status_code(StatusCode::SERVICE_UNAVAILABLE);
        res.render("UNAVAILABLE");
        return;
    }

    res.render("OK");
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("healthcheck").get(healthcheck)
}
