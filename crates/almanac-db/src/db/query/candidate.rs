//! Query composition and writes for `recurring_candidate`.

use diesel::dsl;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::CandidateStatus;
use crate::db::schema::recurring_candidate;
use crate::model::candidate::{NewRecurringCandidate, RecurringCandidate};

/// ## Summary
/// Returns a query to find a candidate by ID.
#[must_use]
pub fn by_id(id: Uuid) -> recurring_candidate::BoxedQuery<'static, diesel::pg::Pg> {
    recurring_candidate::table
        .filter(recurring_candidate::id.eq(id))
        .into_boxed()
}

/// ## Summary
/// Returns a query for an owner's candidates in a given review state.
#[must_use]
pub fn by_owner_and_status(
    owner_id: Uuid,
    status: CandidateStatus,
) -> recurring_candidate::BoxedQuery<'static, diesel::pg::Pg> {
    recurring_candidate::table
        .filter(recurring_candidate::owner_id.eq(owner_id))
        .filter(recurring_candidate::status.eq(status))
        .order(recurring_candidate::confidence.desc())
        .into_boxed()
}

/// ## Summary
/// Loads a candidate by ID.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<RecurringCandidate>> {
    by_id(id)
        .select(RecurringCandidate::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads an owner's candidates in one review state, most confident first.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_for_owner(
    conn: &mut DbConnection<'_>,
    owner_id: Uuid,
    status: CandidateStatus,
) -> QueryResult<Vec<RecurringCandidate>> {
    by_owner_and_status(owner_id, status)
        .select(RecurringCandidate::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Inserts candidates whose `(owner_id, cluster_key)` is new and returns only
/// the rows that were actually inserted.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn, candidates), fields(count = candidates.len()))]
pub async fn insert_new(
    conn: &mut DbConnection<'_>,
    candidates: &[NewRecurringCandidate],
) -> QueryResult<Vec<RecurringCandidate>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    diesel::insert_into(recurring_candidate::table)
        .values(candidates)
        .on_conflict((recurring_candidate::owner_id, recurring_candidate::cluster_key))
        .do_nothing()
        .returning(RecurringCandidate::as_returning())
        .get_results(conn)
        .await
}

/// ## Summary
/// Moves a candidate from `from` to `to`; a candidate in any other state is
/// left untouched and `0` is returned.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn transition(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    from: CandidateStatus,
    to: CandidateStatus,
) -> QueryResult<usize> {
    diesel::update(
        recurring_candidate::table
            .filter(recurring_candidate::id.eq(id))
            .filter(recurring_candidate::status.eq(from)),
    )
    .set((
        recurring_candidate::status.eq(to),
        recurring_candidate::updated_at.eq(dsl::now),
    ))
    .execute(conn)
    .await
}
