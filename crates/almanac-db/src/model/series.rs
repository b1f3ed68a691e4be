use chrono::{NaiveDate, NaiveTime};
use diesel::{pg::Pg, prelude::*};

use crate::db::{
    enums::{EventCategory, Priority, SeriesSource},
    schema,
};

/// A recurrence definition from which calendar instances are generated.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::event_series)]
#[diesel(check_for_backend(Pg))]
pub struct EventSeries {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub title: String,
    pub normalized_title: String,
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
    pub source_cluster_key: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for event series
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::event_series)]
pub struct NewEventSeries {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub title: String,
    pub normalized_title: String,
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
    pub source_cluster_key: Option<String>,
    pub is_active: bool,
}

/// A per-date modification or cancellation of one series occurrence.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::event_override)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(EventSeries, foreign_key = series_id))]
pub struct EventOverride {
    pub id: uuid::Uuid,
    pub series_id: uuid::Uuid,
    pub occurrence_date: NaiveDate,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub is_cancelled: bool,
    pub is_completed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for overrides
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::event_override)]
pub struct NewEventOverride {
    pub id: uuid::Uuid,
    pub series_id: uuid::Uuid,
    pub occurrence_date: NaiveDate,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub is_cancelled: bool,
    pub is_completed: bool,
}
