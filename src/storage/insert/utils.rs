//! Utility functions for database insert operations.
//!
//! Helpers for building batched statements and converting values into their
//! stored representation.

use chrono::{DateTime, TimeZone, Utc};

use crate::error_handling::StoreError;

/// Converts a UTC timestamp to milliseconds since Unix epoch.
pub(crate) fn datetime_to_millis(datetime: Option<&DateTime<Utc>>) -> Option<i64> {
    datetime.map(|dt| dt.timestamp_millis())
}

/// Inverse of [`datetime_to_millis`]. Out-of-range values yield `None`.
pub(crate) fn millis_to_datetime(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Converts an unsigned size or count to the signed BIGINT the schema uses.
pub(crate) fn to_bigint(field: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::ValueOutOfRange { field, value })
}

/// Builds a batch INSERT SQL query string with numbered placeholders.
///
/// Placeholders are `$1, $2, ...` so the same text runs on PostgreSQL and SQLite.
///
/// # Arguments
///
/// * `table_name` - Name of the table to insert into
/// * `columns` - Column names (e.g., `["bucket_id", "object_key"]`)
/// * `row_count` - Number of rows to insert
/// * `conflict_clause` - Optional conflict resolution clause
///
/// # Example
///
/// ```rust,ignore
/// let query = build_batch_insert_query("bucket_objects", &["bucket_id", "object_key"], 2, None);
/// // INSERT INTO bucket_objects (bucket_id, object_key) VALUES ($1, $2), ($3, $4)
/// ```
pub(crate) fn build_batch_insert_query(
    table_name: &str,
    columns: &[&str],
    row_count: usize,
    conflict_clause: Option<&str>,
) -> String {
    if row_count == 0 || columns.is_empty() {
        return String::new();
    }

    let num_columns = columns.len();
    let rows: Vec<String> = (0..row_count)
        .map(|row| {
            let placeholders: Vec<String> = (1..=num_columns)
                .map(|col| format!("${}", row * num_columns + col))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    let mut query = format!(
        "INSERT INTO {} ({}) VALUES {}",
        table_name,
        columns.join(", "),
        rows.join(", ")
    );

    if let Some(conflict) = conflict_clause {
        query.push(' ');
        query.push_str(conflict);
    }

    query
}

/// Number of statements needed to write `total` rows `batch_size` at a time.
pub(crate) fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}
