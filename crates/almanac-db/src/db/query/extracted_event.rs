//! Query composition and writes for `extracted_event`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::extracted_event;
use crate::model::extracted_event::{ExtractedEvent, NewExtractedEvent};

/// ## Summary
/// Returns a query to select all extracted events.
#[must_use]
pub fn all() -> extracted_event::BoxedQuery<'static, diesel::pg::Pg> {
    extracted_event::table.into_boxed()
}

/// ## Summary
/// Returns a query to find an extracted event by ID.
#[must_use]
pub fn by_id(id: Uuid) -> extracted_event::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(extracted_event::id.eq(id))
}

/// ## Summary
/// Returns a query for a document's extracted events in insertion order.
#[must_use]
pub fn by_document(document_id: Uuid) -> extracted_event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(extracted_event::document_id.eq(document_id))
        .order(extracted_event::created_at.asc())
}

/// ## Summary
/// Returns a query for a document's events that have not been imported yet.
#[must_use]
pub fn pending_import(document_id: Uuid) -> extracted_event::BoxedQuery<'static, diesel::pg::Pg> {
    by_document(document_id).filter(extracted_event::is_imported.eq(false))
}

/// ## Summary
/// Inserts the results of one extraction batch.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, events), fields(count = events.len()))]
pub async fn insert_batch(conn: &mut DbConnection<'_>, events: &[NewExtractedEvent]) -> QueryResult<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(extracted_event::table)
        .values(events)
        .execute(conn)
        .await
}

/// ## Summary
/// Loads a document's extracted events, optionally only those still awaiting import.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_for_document(
    conn: &mut DbConnection<'_>,
    document_id: Uuid,
    pending_only: bool,
) -> QueryResult<Vec<ExtractedEvent>> {
    let query = if pending_only {
        pending_import(document_id)
    } else {
        by_document(document_id)
    };
    query.select(ExtractedEvent::as_select()).load(conn).await
}

/// ## Summary
/// Deletes a document's extracted events that were never imported.
///
/// Imported rows stay as the record of where their calendar events came from.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_pending(conn: &mut DbConnection<'_>, document_id: Uuid) -> QueryResult<usize> {
    diesel::delete(
        extracted_event::table
            .filter(extracted_event::document_id.eq(document_id))
            .filter(extracted_event::is_imported.eq(false)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Loads an extracted event by ID.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<ExtractedEvent>> {
    by_id(id)
        .select(ExtractedEvent::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Flips `is_imported` to true if it is still false.
///
/// Returns the number of rows changed: `0` means the event was already
/// imported (or does not exist).
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn mark_imported(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::update(
        extracted_event::table
            .filter(extracted_event::id.eq(id))
            .filter(extracted_event::is_imported.eq(false)),
    )
    .set(extracted_event::is_imported.eq(true))
    .execute(conn)
    .await
}
