//! Ingestion of scan results.
//!
//! Scan results arrive as JSON lines, one [`Bucket`] per line. Each bucket is
//! stored independently: a malformed line or a failed write is logged and
//! counted, and ingestion moves on to the next line.

use std::path::Path;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::bucket::Bucket;
use crate::error_handling::IngestError;
use crate::storage::{Database, StoreOutcome};

/// Tally of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Non-blank lines read
    pub read: usize,
    /// Buckets committed
    pub stored: usize,
    /// Buckets skipped because they do not exist
    pub skipped: usize,
    /// Lines that could not be parsed or stored
    pub failed: usize,
    /// Object rows written across all stored buckets
    pub objects_written: usize,
}

impl IngestReport {
    /// True when every line was either stored or skipped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} read, {} stored, {} skipped, {} failed, {} objects written",
            self.read, self.stored, self.skipped, self.failed, self.objects_written
        )
    }
}

/// Stores every bucket read from `reader`.
///
/// # Errors
///
/// Returns `IngestError::Read` only if reading the input itself fails.
pub async fn ingest_reader<R>(db: &Database, reader: R) -> Result<IngestReport, IngestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut report = IngestReport::default();
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        report.read += 1;

        let bucket: Bucket = match serde_json::from_str(line) {
            Ok(bucket) => bucket,
            Err(e) => {
                warn!("Skipping malformed line {line_number}: {e}");
                report.failed += 1;
                continue;
            }
        };

        match db.store_bucket(&bucket).await {
            Ok(StoreOutcome::Stored {
                objects_written, ..
            }) => {
                debug!("Stored bucket {} ({objects_written} objects)", bucket.name);
                report.stored += 1;
                report.objects_written += objects_written;
            }
            Ok(StoreOutcome::Skipped) => report.skipped += 1,
            Err(e) => {
                error!("Failed to store bucket {} (line {line_number}): {e}", bucket.name);
                report.failed += 1;
            }
        }
    }

    info!("Ingestion finished: {report}");
    Ok(report)
}

/// Stores every bucket in the JSON lines file at `path`, or stdin for `-`.
pub async fn ingest_path(db: &Database, path: &Path) -> Result<IngestReport, IngestError> {
    if path.as_os_str() == "-" {
        info!("Reading buckets from stdin");
        return ingest_reader(db, BufReader::new(tokio::io::stdin())).await;
    }

    info!("Reading buckets from {}", path.display());
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    ingest_reader(db, BufReader::new(file)).await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::storage::test_helpers::{count_rows, create_test_database};

    #[tokio::test]
    async fn test_ingest_counts_each_outcome() {
        let db = create_test_database().await;
        let input = concat!(
            r#"{"name":"alpha","existence":"exists","objects_enumerated":true,"objects":[{"key":"a","size":1},{"key":"b","size":2}]}"#,
            "\n\n",
            r#"{"name":"ghost","existence":"does_not_exist"}"#,
            "\n",
            "not json at all\n",
            r#"{"name":"beta"}"#,
            "\n",
        );

        let report = ingest_reader(&db, input.as_bytes()).await.unwrap();

        assert_eq!(
            report,
            IngestReport {
                read: 4,
                stored: 2,
                skipped: 1,
                failed: 1,
                objects_written: 2,
            }
        );
        assert!(!report.is_clean());
        assert_eq!(count_rows(&db, "buckets").await, 2);
        assert_eq!(count_rows(&db, "bucket_objects").await, 2);
    }

    #[tokio::test]
    async fn test_ingest_continues_after_failed_store() {
        let db = create_test_database().await;
        let input = concat!(
            r#"{"name":"too-big","existence":"exists","objects":[{"key":"x","size":18446744073709551615}]}"#,
            "\n",
            r#"{"name":"fine","existence":"exists"}"#,
        );

        let report = ingest_reader(&db, input.as_bytes()).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.stored, 1);
        assert!(db.load_bucket("fine").await.unwrap().is_some());
        assert!(db.load_bucket("too-big").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_path_reads_file() {
        let db = create_test_database().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name":"from-file","region":"eu-west-1"}}"#).unwrap();
        file.flush().unwrap();

        let report = ingest_path(&db, file.path()).await.unwrap();

        assert_eq!(report.stored, 1);
        let bucket = db.load_bucket("from-file").await.unwrap().unwrap();
        assert_eq!(bucket.region, "eu-west-1");
    }

    #[tokio::test]
    async fn test_ingest_path_missing_file() {
        let db = create_test_database().await;
        let result = ingest_path(&db, Path::new("/nonexistent/scan.jsonl")).await;
        assert!(matches!(result, Err(IngestError::Open { .. })));
    }

    #[test]
    fn test_report_display() {
        let report = IngestReport {
            read: 3,
            stored: 2,
            skipped: 1,
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "3 read, 2 stored, 1 skipped, 0 failed, 0 objects written"
        );
        assert!(report.is_clean());
    }
}
