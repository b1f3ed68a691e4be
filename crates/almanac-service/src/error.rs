use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] almanac_db::error::DbError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),

    #[error(transparent)]
    TextError(#[from] almanac_text::error::TextError),

    #[error(transparent)]
    CompletionError(#[from] CompletionError),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failures talking to the completion service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("malformed completion output: {0}")]
    MalformedOutput(String),
}

impl CompletionError {
    /// Only server errors and transport failures are worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport(_) => true,
            Self::MalformedOutput(_) => false,
        }
    }
}
