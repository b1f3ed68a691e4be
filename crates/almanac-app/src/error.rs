use salvo::{Response, http::StatusCode, writing::Json};
use serde::Serialize;
use thiserror::Error;

use almanac_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] almanac_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(err) => match err {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::ValidationError(_)
                | ServiceError::InvalidInput(_)
                | ServiceError::TextError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_) | Self::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// ## Summary
    /// Writes the status and `{ "error": ... }` body for this error.
    ///
    /// Server-side failures are logged and answered with a generic message.
    pub fn render(self, res: &mut Response) {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
            self.to_string()
        };

        res.status_code(status);
        res.render(Json(ErrorResponse { error: message }));
    }
}
