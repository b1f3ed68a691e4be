//! Query composition and writes for `event_override`.

use diesel::dsl;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_override;
use crate::model::series::{EventOverride, NewEventOverride};

/// ## Summary
/// Returns a query for the overrides of a series, by date.
#[must_use]
pub fn by_series(series_id: Uuid) -> event_override::BoxedQuery<'static, diesel::pg::Pg> {
    event_override::table
        .filter(event_override::series_id.eq(series_id))
        .order(event_override::occurrence_date.asc())
        .into_boxed()
}

/// ## Summary
/// Loads the overrides of a series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_for_series(conn: &mut DbConnection<'_>, series_id: Uuid) -> QueryResult<Vec<EventOverride>> {
    by_series(series_id)
        .select(EventOverride::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Inserts an override, or replaces every field of the existing override for
/// the same `(series_id, occurrence_date)`.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, new_override), fields(series_id = %new_override.series_id, date = %new_override.occurrence_date))]
pub async fn upsert(conn: &mut DbConnection<'_>, new_override: &NewEventOverride) -> QueryResult<EventOverride> {
    diesel::insert_into(event_override::table)
        .values(new_override)
        .on_conflict((event_override::series_id, event_override::occurrence_date))
        .do_update()
        .set((
            event_override::title.eq(excluded(event_override::title)),
            event_override::description.eq(excluded(event_override::description)),
            event_override::start_time.eq(excluded(event_override::start_time)),
            event_override::end_time.eq(excluded(event_override::end_time)),
            event_override::location.eq(excluded(event_override::location)),
            event_override::is_cancelled.eq(excluded(event_override::is_cancelled)),
            event_override::is_completed.eq(excluded(event_override::is_completed)),
            event_override::updated_at.eq(dsl::now),
        ))
        .returning(EventOverride::as_returning())
        .get_result(conn)
        .await
}
