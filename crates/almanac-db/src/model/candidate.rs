use chrono::{NaiveDate, NaiveTime};
use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::CandidateStatus, schema};

/// A detected recurring pattern awaiting user review.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::recurring_candidate)]
#[diesel(check_for_backend(Pg))]
pub struct RecurringCandidate {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub cluster_key: String,
    pub source_event_ids: Vec<uuid::Uuid>,
    pub pattern: String,
    pub confidence: f64,
    pub title: String,
    pub normalized_title: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub suggested_rrule: String,
    pub occurrence_dates: Vec<NaiveDate>,
    pub status: CandidateStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for recurring candidates
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::recurring_candidate)]
pub struct NewRecurringCandidate {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub cluster_key: String,
    pub source_event_ids: Vec<uuid::Uuid>,
    pub pattern: String,
    pub confidence: f64,
    pub title: String,
    pub normalized_title: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub suggested_rrule: String,
    pub occurrence_dates: Vec<NaiveDate>,
    pub status: CandidateStatus,
}
