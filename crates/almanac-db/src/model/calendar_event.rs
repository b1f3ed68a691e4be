use chrono::{NaiveDate, NaiveTime};
use diesel::{pg::Pg, prelude::*};

use crate::db::{
    enums::{CalendarSource, EventCategory, Priority},
    schema,
};

/// A concrete dated entry on a user's calendar.
///
/// Series instances carry `series_id` and `occurrence_date`; the pair is unique.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::calendar_event)]
#[diesel(check_for_backend(Pg))]
pub struct CalendarEvent {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub priority: Priority,
    pub source: CalendarSource,
    pub source_id: Option<uuid::Uuid>,
    pub is_completed: bool,
    pub series_id: Option<uuid::Uuid>,
    pub occurrence_date: Option<NaiveDate>,
    pub is_series_instance: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert struct for calendar events
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::calendar_event)]
pub struct NewCalendarEvent {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub category: EventCategory,
    pub priority: Priority,
    pub source: CalendarSource,
    pub source_id: Option<uuid::Uuid>,
    pub is_completed: bool,
    pub series_id: Option<uuid::Uuid>,
    pub occurrence_date: Option<NaiveDate>,
    pub is_series_instance: bool,
}

/// Fields of a series instance that an override may replace.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = schema::calendar_event)]
#[diesel(treat_none_as_null = true)]
pub struct InstanceChanges {
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub is_completed: bool,
}
