//! Batched object row writes.

use sqlx::{Any, Transaction};

use super::utils::{batch_count, build_batch_insert_query, datetime_to_millis, to_bigint};
use crate::bucket::BucketObject;
use crate::error_handling::StoreError;
use crate::storage::query_log::QueryTracer;

/// Columns bound for every object row.
pub(crate) const OBJECT_COLUMNS: [&str; 4] = ["bucket_id", "object_key", "size", "last_modified"];

const DELETE_OBJECTS_SQL: &str = "DELETE FROM bucket_objects WHERE bucket_id = $1";

/// Removes every object row of `bucket_id`. Returns the number of rows deleted.
pub(crate) async fn delete_objects(
    tx: &mut Transaction<'_, Any>,
    tracer: &QueryTracer,
    bucket_id: i64,
) -> Result<u64, StoreError> {
    let result = tracer
        .observe(
            DELETE_OBJECTS_SQL,
            sqlx::query(DELETE_OBJECTS_SQL)
                .bind(bucket_id)
                .execute(&mut **tx),
        )
        .await?;
    Ok(result.rows_affected())
}

/// Inserts `objects` for `bucket_id`, at most `batch_size` rows per statement.
///
/// Returns the number of statements executed. Any failure aborts the whole
/// write; the caller rolls the transaction back.
pub(crate) async fn insert_objects(
    tx: &mut Transaction<'_, Any>,
    tracer: &QueryTracer,
    bucket_id: i64,
    objects: &[BucketObject],
    batch_size: usize,
) -> Result<usize, StoreError> {
    if objects.is_empty() {
        return Ok(0);
    }
    if batch_size == 0 {
        return Err(StoreError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }

    // Reject unrepresentable sizes before any row is written.
    let sizes = objects
        .iter()
        .map(|obj| to_bigint("size", obj.size))
        .collect::<Result<Vec<_>, _>>()?;

    let mut batches = 0;
    for (chunk_index, chunk) in objects.chunks(batch_size).enumerate() {
        let offset = chunk_index * batch_size;
        let sql = build_batch_insert_query("bucket_objects", &OBJECT_COLUMNS, chunk.len(), None);

        let mut query = sqlx::query(&sql);
        for (i, obj) in chunk.iter().enumerate() {
            query = query
                .bind(bucket_id)
                .bind(obj.key.as_str())
                .bind(sizes[offset + i])
                .bind(datetime_to_millis(obj.last_modified.as_ref()));
        }

        tracer
            .observe(&sql, query.execute(&mut **tx))
            .await
            .map_err(|e| {
                log::error!(
                    "Failed to insert objects {}..{} for bucket_id {}: {}",
                    offset,
                    offset + chunk.len(),
                    bucket_id,
                    e
                );
                StoreError::Sql(e)
            })?;
        batches += 1;
    }

    debug_assert_eq!(batches, batch_count(objects.len(), batch_size));
    log::debug!(
        "Inserted {} objects for bucket_id {} in {} batch(es)",
        objects.len(),
        bucket_id,
        batches
    );

    Ok(batches)
}
