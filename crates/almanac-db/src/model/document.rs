use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::DocumentStatus, schema};

/// An uploaded file and its processing state.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::document)]
#[diesel(check_for_backend(Pg))]
pub struct Document {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub file_name: String,
    pub media_type: String,
    pub byte_size: i64,
    pub storage_key: String,
    pub status: DocumentStatus,
    pub progress: i16,
    pub extracted_text: Option<String>,
    pub processing_time_secs: Option<f64>,
    pub error_message: Option<String>,
    pub processing_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for registering an uploaded document
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::document)]
pub struct NewDocument<'a> {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub file_name: &'a str,
    pub media_type: &'a str,
    pub byte_size: i64,
    pub storage_key: &'a str,
    pub status: DocumentStatus,
    pub progress: i16,
}
