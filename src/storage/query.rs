//! Read and maintenance operations on stored buckets.

use sqlx::any::AnyRow;
use sqlx::Row;

use super::connection::Database;
use super::insert::utils::millis_to_datetime;
use crate::bucket::{Bucket, BucketExistence, BucketObject, BucketPermissions, PERMISSION_COLUMNS};
use crate::error_handling::StoreError;

impl Database {
    /// Loads the stored bucket called `name` together with its objects.
    ///
    /// Returns `Ok(None)` when no such bucket is stored. The absence is not
    /// reported as an error by the query logger.
    pub async fn load_bucket(&self, name: &str) -> Result<Option<Bucket>, StoreError> {
        let sql = format!(
            "SELECT id, name, region, provider, existence, date_scanned, objects_enumerated,
                    owner_id, owner_display_name, {}
             FROM buckets WHERE name = $1",
            PERMISSION_COLUMNS.join(", ")
        );
        let row = match self
            .tracer
            .observe(&sql, sqlx::query(&sql).bind(name).fetch_one(&self.pool))
            .await
        {
            Ok(row) => row,
            Err(sqlx::Error::RowNotFound) => return Ok(None),
            Err(e) => return Err(StoreError::Sql(e)),
        };

        let bucket_id: i64 = row.try_get("id")?;
        let mut bucket = bucket_from_row(&row)?;

        let objects_sql = "SELECT object_key, size, last_modified FROM bucket_objects
                           WHERE bucket_id = $1 ORDER BY id";
        let rows = self
            .tracer
            .observe(
                objects_sql,
                sqlx::query(objects_sql).bind(bucket_id).fetch_all(&self.pool),
            )
            .await?;
        bucket.objects = rows
            .iter()
            .map(object_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(bucket))
    }

    /// Deletes the bucket called `name` and, by cascade, its objects.
    ///
    /// Returns whether a bucket was deleted.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, StoreError> {
        let sql = "DELETE FROM buckets WHERE name = $1";
        let mut tx = self.tracer.observe("BEGIN", self.pool.begin()).await?;

        // Child rows go first so the result does not depend on the backend
        // enforcing foreign keys.
        let objects_sql =
            "DELETE FROM bucket_objects WHERE bucket_id IN (SELECT id FROM buckets WHERE name = $1)";
        self.tracer
            .observe(objects_sql, sqlx::query(objects_sql).bind(name).execute(&mut *tx))
            .await?;
        let result = self
            .tracer
            .observe(sql, sqlx::query(sql).bind(name).execute(&mut *tx))
            .await?;

        self.tracer.observe("COMMIT", tx.commit()).await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            log::info!("Deleted bucket {name}");
        }
        Ok(deleted)
    }

    /// Number of stored buckets.
    pub async fn count_buckets(&self) -> Result<i64, StoreError> {
        self.count("SELECT COUNT(*) FROM buckets").await
    }

    /// Number of stored objects across all buckets.
    pub async fn count_objects(&self) -> Result<i64, StoreError> {
        self.count("SELECT COUNT(*) FROM bucket_objects").await
    }

    async fn count(&self, sql: &str) -> Result<i64, StoreError> {
        let count = self
            .tracer
            .observe(sql, sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool))
            .await?;
        Ok(count)
    }
}

fn bucket_from_row(row: &AnyRow) -> Result<Bucket, StoreError> {
    let existence_code: i64 = row.try_get("existence")?;
    let existence = BucketExistence::from_code(existence_code).unwrap_or_default();

    let mut codes = [0i64; 10];
    for (code, column) in codes.iter_mut().zip(PERMISSION_COLUMNS.iter()) {
        *code = row.try_get(*column)?;
    }

    let date_scanned: i64 = row.try_get("date_scanned")?;
    let objects_enumerated: i64 = row.try_get("objects_enumerated")?;

    Ok(Bucket {
        name: row.try_get("name")?,
        region: row.try_get("region")?,
        provider: row.try_get("provider")?,
        existence,
        date_scanned: millis_to_datetime(Some(date_scanned)).unwrap_or_default(),
        permissions: BucketPermissions::from_codes(codes),
        owner_id: row.try_get("owner_id")?,
        owner_display_name: row.try_get("owner_display_name")?,
        objects_enumerated: objects_enumerated != 0,
        objects: Vec::new(),
    })
}

fn object_from_row(row: &AnyRow) -> Result<BucketObject, StoreError> {
    let size: i64 = row.try_get("size")?;
    let last_modified: Option<i64> = row.try_get("last_modified")?;
    Ok(BucketObject {
        key: row.try_get("object_key")?,
        // Sizes were range-checked on the way in.
        size: u64::try_from(size).unwrap_or_default(),
        last_modified: millis_to_datetime(last_modified),
    })
}
