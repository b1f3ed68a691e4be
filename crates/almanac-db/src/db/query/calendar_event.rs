//! Query composition and writes for `calendar_event`.

use chrono::NaiveDate;
use diesel::dsl;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::calendar_event;
use crate::model::calendar_event::{CalendarEvent, InstanceChanges, NewCalendarEvent};

/// ## Summary
/// Returns a query to select all calendar events.
#[must_use]
pub fn all() -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    calendar_event::table.into_boxed()
}

/// ## Summary
/// Returns a query for the instances generated from a series, by date.
#[must_use]
pub fn by_series(series_id: Uuid) -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(calendar_event::series_id.eq(series_id))
        .order(calendar_event::occurrence_date.asc())
}

/// ## Summary
/// Returns a query for an owner's events that do not belong to any series,
/// ordered by date. These are the inputs to recurring-pattern detection.
#[must_use]
pub fn unlinked_for_owner(owner_id: Uuid) -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(calendar_event::owner_id.eq(owner_id))
        .filter(calendar_event::series_id.is_null())
        .order((calendar_event::event_date.asc(), calendar_event::id.asc()))
}

/// ## Summary
/// Returns a query for the events created from one source record.
#[must_use]
pub fn by_source_id(source_id: Uuid) -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(calendar_event::source_id.eq(source_id))
        .order(calendar_event::event_date.asc())
}

/// ## Summary
/// Inserts calendar events and returns their IDs.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, events), fields(count = events.len()))]
pub async fn insert_batch(conn: &mut DbConnection<'_>, events: &[NewCalendarEvent]) -> QueryResult<Vec<Uuid>> {
    if events.is_empty() {
        return Ok(Vec::new());
    }

    diesel::insert_into(calendar_event::table)
        .values(events)
        .returning(calendar_event::id)
        .get_results(conn)
        .await
}

/// ## Summary
/// Inserts series instances, skipping any `(series_id, occurrence_date)`
/// pair that already exists.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, instances), fields(count = instances.len()))]
pub async fn insert_instances(conn: &mut DbConnection<'_>, instances: &[NewCalendarEvent]) -> QueryResult<usize> {
    if instances.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(calendar_event::table)
        .values(instances)
        .on_conflict((calendar_event::series_id, calendar_event::occurrence_date))
        .do_nothing()
        .execute(conn)
        .await
}

/// ## Summary
/// Lists the occurrence dates already materialized for a series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn instance_dates(conn: &mut DbConnection<'_>, series_id: Uuid) -> QueryResult<Vec<NaiveDate>> {
    let dates: Vec<Option<NaiveDate>> = by_series(series_id)
        .select(calendar_event::occurrence_date)
        .load(conn)
        .await?;
    Ok(dates.into_iter().flatten().collect())
}

/// ## Summary
/// Loads an owner's unlinked events.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_unlinked(conn: &mut DbConnection<'_>, owner_id: Uuid) -> QueryResult<Vec<CalendarEvent>> {
    unlinked_for_owner(owner_id)
        .select(CalendarEvent::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Loads the events created from one source record.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_from_source(conn: &mut DbConnection<'_>, source_id: Uuid) -> QueryResult<Vec<CalendarEvent>> {
    by_source_id(source_id)
        .select(CalendarEvent::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Deletes the instance of a series on one date.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_instance(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    occurrence_date: NaiveDate,
) -> QueryResult<usize> {
    diesel::delete(
        calendar_event::table
            .filter(calendar_event::series_id.eq(series_id))
            .filter(calendar_event::occurrence_date.eq(occurrence_date)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Applies override fields to the instance of a series on one date.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update_instance(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    occurrence_date: NaiveDate,
    changes: &InstanceChanges,
) -> QueryResult<usize> {
    diesel::update(
        calendar_event::table
            .filter(calendar_event::series_id.eq(series_id))
            .filter(calendar_event::occurrence_date.eq(occurrence_date)),
    )
    .set((changes, calendar_event::updated_at.eq(dsl::now)))
    .execute(conn)
    .await
}
