//! Database migration management.

use std::path::PathBuf;

use sqlx::migrate::Migrator;
use sqlx::AnyPool;

use super::pool::Backend;
use crate::error_handling::StoreError;

/// Directory holding the migration set for `backend`.
pub(crate) fn migrations_path(backend: Backend) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("migrations")
        .join(backend.migrations_dir())
}

/// Runs the SQLx migrations for `backend`, creating or updating the
/// `buckets` and `bucket_objects` tables. Already-applied migrations are skipped.
pub async fn run_migrations(pool: &AnyPool, backend: Backend) -> Result<(), StoreError> {
    let migrations_dir = migrations_path(backend);
    let migrator = Migrator::new(migrations_dir.as_path()).await?;
    migrator.run(pool).await?;
    Ok(())
}
