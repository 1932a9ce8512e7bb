//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data creation
//! used across storage module tests.

use std::sync::Arc;

use crate::bucket::{Bucket, BucketExistence, BucketObject};
use crate::config::StoreConfig;
use crate::storage::connection::Database;
use crate::storage::query_log::LogQueryLogger;

/// Creates an in-memory test database with migrations applied.
pub async fn create_test_database() -> Database {
    create_test_database_with(StoreConfig::new("sqlite::memory:", true)).await
}

/// Creates a test database from `config` and applies migrations.
pub async fn create_test_database_with(config: StoreConfig) -> Database {
    let db = Database::open(&config, Arc::new(LogQueryLogger))
        .await
        .expect("Failed to open test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");
    db
}

/// Counts the rows of `table`.
pub async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .expect("Failed to count rows")
}

/// Creates an existing bucket in `us-east-1` with `object_count` objects named
/// `object-00000`, `object-00001`, ...
pub fn test_bucket(name: &str, object_count: usize) -> Bucket {
    let objects = (0..object_count)
        .map(|i| BucketObject::new(format!("object-{i:05}"), (i as u64 + 1) * 100))
        .collect();
    let mut bucket = Bucket::new(name, BucketExistence::Exists).with_objects(objects);
    bucket.region = "us-east-1".to_string();
    bucket
}
