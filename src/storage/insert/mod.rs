//! Bucket write path.
//!
//! A bucket and all of its objects are written in one transaction:
//! 1. upsert the `buckets` row by name
//! 2. drop the objects stored by any previous scan of that bucket
//! 3. insert the current objects in batches of at most `batch_size` rows
//!
//! Either everything commits or nothing does.

mod bucket;
mod objects;
pub(crate) mod utils;

use log::{debug, warn};
use sqlx::{Any, Transaction};

use crate::bucket::Bucket;
use crate::error_handling::StoreError;
use crate::storage::connection::Database;
use crate::storage::retry::with_retry;

use bucket::upsert_bucket;
use objects::{delete_objects, insert_objects};
pub(crate) use objects::OBJECT_COLUMNS;

/// Result of a [`Database::store_bucket`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The bucket is known not to exist; nothing was written.
    Skipped,
    /// The bucket and its objects were committed.
    Stored {
        /// Row id of the bucket
        bucket_id: i64,
        /// Object rows inserted
        objects_written: usize,
        /// INSERT statements used for the objects
        batches: usize,
    },
}

impl Database {
    /// Persists `bucket` and all of its objects atomically.
    ///
    /// Buckets whose existence is `DoesNotExist` are skipped without touching
    /// the database. Storing a bucket whose name is already present replaces
    /// the stored row and its objects.
    ///
    /// Errors from the database are returned as-is; they are retried only
    /// when the configured `RetryPolicy` asks for it.
    pub async fn store_bucket(&self, bucket: &Bucket) -> Result<StoreOutcome, StoreError> {
        if !bucket.is_persistable() {
            debug!("Skipping bucket {}: {}", bucket.name, bucket.existence);
            return Ok(StoreOutcome::Skipped);
        }

        with_retry(&self.retry, &bucket.name, || self.write_bucket(bucket)).await
    }

    /// One attempt at writing `bucket` inside a fresh transaction.
    async fn write_bucket(&self, bucket: &Bucket) -> Result<StoreOutcome, StoreError> {
        let mut tx = self.tracer.observe("BEGIN", self.pool.begin()).await?;

        let result = self.write_in_transaction(&mut tx, bucket).await;
        match result {
            Ok(outcome) => {
                self.tracer.observe("COMMIT", tx.commit()).await?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = self.tracer.observe("ROLLBACK", tx.rollback()).await {
                    warn!(
                        "Failed to roll back write of bucket {}: {}",
                        bucket.name, rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn write_in_transaction(
        &self,
        tx: &mut Transaction<'static, Any>,
        bucket: &Bucket,
    ) -> Result<StoreOutcome, StoreError> {
        let bucket_id = upsert_bucket(tx, &self.tracer, bucket).await?;

        let replaced = delete_objects(tx, &self.tracer, bucket_id).await?;
        if replaced > 0 {
            debug!(
                "Replacing {} stored objects of bucket {}",
                replaced, bucket.name
            );
        }

        let batches =
            insert_objects(tx, &self.tracer, bucket_id, &bucket.objects, self.batch_size).await?;

        Ok(StoreOutcome::Stored {
            bucket_id,
            objects_written: bucket.objects.len(),
            batches,
        })
    }
}
