//! Query composition and writes for `document`.

use chrono::{DateTime, Utc};
use diesel::dsl;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::DocumentStatus;
use crate::db::schema::document;
use crate::model::document::{Document, NewDocument};

/// Predicate matching a document that a new processing run may claim.
pub type Claimable = dsl::And<
    dsl::Eq<document::id, Uuid>,
    dsl::Or<
        dsl::Or<dsl::NotEq<document::status, DocumentStatus>, dsl::IsNull<document::processing_started_at>>,
        dsl::Lt<document::processing_started_at, DateTime<Utc>>,
    >,
>;

/// ## Summary
/// Returns a query to select all documents.
#[must_use]
pub fn all() -> document::BoxedQuery<'static, diesel::pg::Pg> {
    document::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a document by ID.
#[must_use]
pub fn by_id(id: Uuid) -> document::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(document::id.eq(id))
}

/// ## Summary
/// Returns a query to list an owner's documents, newest first.
#[must_use]
pub fn by_owner(owner_id: Uuid) -> document::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(document::owner_id.eq(owner_id))
        .order(document::created_at.desc())
}

/// ## Summary
/// Matches `id` when it is not being processed, or when the current run
/// started before `stale_before` and is presumed dead.
#[must_use]
pub fn claimable(id: Uuid, stale_before: DateTime<Utc>) -> Claimable {
    document::id.eq(id).and(
        document::status
            .ne(DocumentStatus::Processing)
            .or(document::processing_started_at.is_null())
            .or(document::processing_started_at.lt(stale_before)),
    )
}

/// ## Summary
/// Inserts a new document row.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, new_document), fields(owner_id = %new_document.owner_id))]
pub async fn insert(conn: &mut DbConnection<'_>, new_document: &NewDocument<'_>) -> QueryResult<Document> {
    diesel::insert_into(document::table)
        .values(new_document)
        .returning(Document::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Loads an owner's documents, newest first.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_for_owner(conn: &mut DbConnection<'_>, owner_id: Uuid) -> QueryResult<Vec<Document>> {
    by_owner(owner_id).select(Document::as_select()).load(conn).await
}

/// ## Summary
/// Loads a document by ID.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<Document>> {
    by_id(id)
        .select(Document::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Atomically moves a claimable document to `processing`, resetting progress
/// and any previous error.
///
/// Returns `None` when another run holds a fresh claim.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn))]
pub async fn claim(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
) -> QueryResult<Option<Document>> {
    diesel::update(document::table.filter(claimable(id, stale_before)))
        .set((
            document::status.eq(DocumentStatus::Processing),
            document::progress.eq(0_i16),
            document::error_message.eq(None::<String>),
            document::processing_started_at.eq(Some(now)),
            document::updated_at.eq(now),
        ))
        .returning(Document::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Raises the progress of a document; lower values are ignored so progress
/// never moves backwards within a run.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn advance_progress(conn: &mut DbConnection<'_>, id: Uuid, progress: i16) -> QueryResult<usize> {
    diesel::update(
        document::table
            .filter(document::id.eq(id))
            .filter(document::progress.lt(progress)),
    )
    .set((
        document::progress.eq(progress),
        document::updated_at.eq(dsl::now),
    ))
    .execute(conn)
    .await
}

/// ## Summary
/// Stores the extracted-text excerpt for a document.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_extracted_text(conn: &mut DbConnection<'_>, id: Uuid, excerpt: &str) -> QueryResult<usize> {
    diesel::update(document::table.filter(document::id.eq(id)))
        .set((
            document::extracted_text.eq(excerpt),
            document::updated_at.eq(dsl::now),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Marks a run as completed with its duration.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn complete(conn: &mut DbConnection<'_>, id: Uuid, processing_time_secs: f64) -> QueryResult<usize> {
    diesel::update(document::table.filter(document::id.eq(id)))
        .set((
            document::status.eq(DocumentStatus::Completed),
            document::progress.eq(100_i16),
            document::processing_time_secs.eq(Some(processing_time_secs)),
            document::error_message.eq(None::<String>),
            document::updated_at.eq(dsl::now),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Marks a run as failed. Progress is left where the run stopped.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn fail(conn: &mut DbConnection<'_>, id: Uuid, message: &str) -> QueryResult<usize> {
    diesel::update(document::table.filter(document::id.eq(id)))
        .set((
            document::status.eq(DocumentStatus::Error),
            document::error_message.eq(Some(message)),
            document::updated_at.eq(dsl::now),
        ))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes a document; extracted events cascade.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(document::table.filter(document::id.eq(id)))
        .execute(conn)
        .await
}
