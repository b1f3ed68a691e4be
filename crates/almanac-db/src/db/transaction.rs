//! Transaction helper for multi-statement writes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use almanac_db::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, |tx| async move {
//!     extracted_event::mark_imported(tx, event_id).await?;
//!     calendar_event::insert_batch(tx, &rows).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, scoped_futures::ScopedBoxFuture};

use crate::db::connection::DbConnection;

/// ## Summary
/// Runs a database transaction and returns the closure result.
///
/// The transaction is rolled back if the closure returns an error.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'pool, T, E, F>(
    conn: &mut DbConnection<'pool>,
    callback: F,
) -> Result<T, E>
where
    F: for<'r> FnOnce(&'r mut DbConnection<'pool>) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
        + Send
        + 'a,
    E: From<diesel::result::Error> + Send + 'a,
    T: Send + 'a,
{
    conn.transaction::<T, E, _>(callback).await
}
