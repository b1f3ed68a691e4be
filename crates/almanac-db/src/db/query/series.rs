//! Query composition and writes for `event_series`.

use chrono::NaiveDate;
use diesel::dsl;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_series;
use crate::model::series::{EventSeries, NewEventSeries};

/// ## Summary
/// Returns a query to select all series.
#[must_use]
pub fn all() -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    event_series::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a series by ID.
#[must_use]
pub fn by_id(id: Uuid) -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(event_series::id.eq(id))
}

/// ## Summary
/// Returns a query to find the series promoted from a candidate cluster.
#[must_use]
pub fn by_cluster_key(owner_id: Uuid, cluster_key: &str) -> event_series::BoxedQuery<'_, diesel::pg::Pg> {
    all()
        .filter(event_series::owner_id.eq(owner_id))
        .filter(event_series::source_cluster_key.eq(cluster_key))
}

/// ## Summary
/// Loads a series by ID.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<EventSeries>> {
    by_id(id)
        .select(EventSeries::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads a series by ID and locks the row until the transaction ends.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find_for_update(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<EventSeries>> {
    event_series::table
        .find(id)
        .select(EventSeries::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads the series promoted from a candidate cluster, if any.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find_by_cluster_key(
    conn: &mut DbConnection<'_>,
    owner_id: Uuid,
    cluster_key: &str,
) -> QueryResult<Option<EventSeries>> {
    by_cluster_key(owner_id, cluster_key)
        .select(EventSeries::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Inserts a series unless one already exists for its
/// `(owner_id, source_cluster_key)`.
///
/// Returns the inserted row, or `None` when the cluster was already promoted.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, series), fields(owner_id = %series.owner_id))]
pub async fn insert_if_absent(conn: &mut DbConnection<'_>, series: &NewEventSeries) -> QueryResult<Option<EventSeries>> {
    diesel::insert_into(event_series::table)
        .values(series)
        .on_conflict((event_series::owner_id, event_series::source_cluster_key))
        .do_nothing()
        .returning(EventSeries::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Replaces the exclusion list of a series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_excluded_dates(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    excluded_dates: &[NaiveDate],
) -> QueryResult<usize> {
    diesel::update(event_series::table.filter(event_series::id.eq(id)))
        .set((
            event_series::excluded_dates.eq(excluded_dates),
            event_series::updated_at.eq(dsl::now),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes a series; instances and overrides cascade.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(event_series::table.filter(event_series::id.eq(id)))
        .execute(conn)
        .await
}
