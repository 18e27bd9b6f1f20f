// storage/migrations.rs
// Schema migrations

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Applies the SQL files in `migrations/` that have not run yet.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = Migrator::new(dir.as_path()).await?;
    migrator.run(pool).await?;
    log::debug!("Database schema is up to date");
    Ok(())
}
