//! Bucket row upsert.

use std::sync::OnceLock;

use sqlx::{Any, Transaction};

use super::utils::{build_batch_insert_query, datetime_to_millis, to_bigint};
use crate::bucket::{Bucket, PERMISSION_COLUMNS};
use crate::error_handling::StoreError;
use crate::storage::query_log::QueryTracer;

const BUCKET_COLUMNS: [&str; 10] = [
    "name",
    "region",
    "provider",
    "existence",
    "date_scanned",
    "objects_enumerated",
    "num_objects",
    "bucket_size",
    "owner_id",
    "owner_display_name",
];

/// INSERT ... ON CONFLICT(name) DO UPDATE ... RETURNING id, built once.
fn upsert_sql() -> &'static str {
    static SQL: OnceLock<String> = OnceLock::new();
    SQL.get_or_init(|| {
        let columns: Vec<&str> = BUCKET_COLUMNS
            .iter()
            .chain(PERMISSION_COLUMNS.iter())
            .copied()
            .collect();
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| **c != "name")
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        let conflict = format!(
            "ON CONFLICT (name) DO UPDATE SET {} RETURNING id",
            updates.join(", ")
        );
        build_batch_insert_query("buckets", &columns, 1, Some(&conflict))
    })
}

/// Inserts the bucket row, or overwrites the row with the same name.
///
/// Returns the row id, which is stable across rescans of the same bucket.
pub(crate) async fn upsert_bucket(
    tx: &mut Transaction<'_, Any>,
    tracer: &QueryTracer,
    bucket: &Bucket,
) -> Result<i64, StoreError> {
    let num_objects = to_bigint("num_objects", bucket.objects.len() as u64)?;
    let bucket_size = to_bigint("bucket_size", bucket.total_size())?;
    let date_scanned = datetime_to_millis(Some(&bucket.date_scanned)).unwrap_or_default();

    log::debug!("Upserting bucket {} ({})", bucket.name, bucket.existence);

    let sql = upsert_sql();
    let mut query = sqlx::query_scalar::<_, i64>(sql)
        .bind(bucket.name.as_str())
        .bind(bucket.region.as_str())
        .bind(bucket.provider.as_str())
        .bind(bucket.existence.code())
        .bind(date_scanned)
        .bind(i64::from(bucket.objects_enumerated))
        .bind(num_objects)
        .bind(bucket_size)
        .bind(bucket.owner_id.as_deref())
        .bind(bucket.owner_display_name.as_deref());
    for code in bucket.permissions.codes() {
        query = query.bind(code);
    }

    let bucket_id = tracer
        .observe(sql, query.fetch_one(&mut **tx))
        .await
        .map_err(|e| {
            log::error!("Failed to upsert bucket {}: {}", bucket.name, e);
            StoreError::Sql(e)
        })?;

    Ok(bucket_id)
}
