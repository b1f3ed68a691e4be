use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// ## Summary
/// Applies any pending embedded migrations.
///
/// Runs on a blocking thread with a dedicated synchronous connection, since the
/// migration harness is not async.
///
/// ## Errors
/// Returns an error if the connection cannot be established or a migration fails.
#[tracing::instrument(skip(database_url))]
pub async fn run_pending_migrations(database_url: &str) -> anyhow::Result<()> {
    let url = database_url.to_owned();

    let applied = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<String>> {
        let mut conn = PgConnection::establish(&url)?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
        Ok(versions.iter().map(ToString::to_string).collect())
    })
    .await??;

    if applied.is_empty() {
        tracing::debug!("Database schema is up to date");
    } else {
        tracing::info!(count = applied.len(), versions = ?applied, "Applied migrations");
    }

    Ok(())
}
