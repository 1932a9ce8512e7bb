// Shared test helpers for database setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::path::Path;
use std::sync::Arc;

use bucket_store::{
    Bucket, BucketExistence, BucketObject, Database, LogQueryLogger, StoreConfig,
};

/// Connection string for a SQLite file, creating the file if needed.
/// If the database file already exists, it will be reused (not truncated).
#[allow(dead_code)] // Used by other test files
pub fn sqlite_file_url(db_path: &Path) -> String {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .read(true)
        .open(db_path)
        .expect("Failed to create/open database file");
    format!("sqlite:{}", db_path.to_string_lossy())
}

/// Opens a migrated database backed by the SQLite file at `db_path`.
#[allow(dead_code)]
pub async fn create_file_database(db_path: &Path) -> Database {
    let config = StoreConfig::new(sqlite_file_url(db_path), true);
    let db = Database::open(&config, Arc::new(LogQueryLogger))
        .await
        .expect("Failed to open test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");
    db
}

/// Creates an existing bucket with `object_count` objects named `object-00000`, ...
#[allow(dead_code)]
pub fn test_bucket(name: &str, object_count: usize) -> Bucket {
    let objects = (0..object_count)
        .map(|i| BucketObject::new(format!("object-{i:05}"), 100))
        .collect();
    Bucket::new(name, BucketExistence::Exists).with_objects(objects)
}
