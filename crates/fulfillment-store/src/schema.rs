//! Database schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use fulfillment_core::error::DomainError;

/// Migrations for every table used by the fulfillment services.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies any pending migrations.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), DomainError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DomainError::Infrastructure(format!("migration failed: {e}")))?;
    info!("database schema is up to date");
    Ok(())
}
