//! Error type definitions.
//!
//! This module defines the errors returned by the storage layer and by
//! application initialization.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for storage operations.
///
/// Database failures are carried unmodified so callers can inspect the
/// underlying `sqlx::Error`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be reached or rejected the connection.
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Schema setup failed.
    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A statement failed while reading or writing.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// An operation needed the shared connection before `connect` succeeded.
    #[error("Database is not connected; call connect() first")]
    NotConnected,

    /// The configuration cannot be used.
    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    /// A value does not fit the column it is stored in.
    #[error("Value out of range for {field}: {value}")]
    ValueOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The value that did not fit
        value: u64,
    },
}

/// Error types for reading scan results.
///
/// Only input failures end an ingestion; bad lines and failed stores are
/// counted in the report instead.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input file could not be opened.
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        /// Path that was being opened
        path: std::path::PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Reading from the input failed.
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),
}

impl StoreError {
    /// The underlying database error, if this error carries one.
    pub fn sqlx_error(&self) -> Option<&sqlx::Error> {
        match self {
            StoreError::Connection(e) | StoreError::Sql(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::ValueOutOfRange {
            field: "size",
            value: u64::MAX,
        };
        assert_eq!(
            err.to_string(),
            format!("Value out of range for size: {}", u64::MAX)
        );
        assert!(StoreError::NotConnected
            .to_string()
            .contains("not connected"));
    }

    #[test]
    fn test_sqlx_error_accessor() {
        let err = StoreError::Sql(sqlx::Error::RowNotFound);
        assert!(matches!(err.sqlx_error(), Some(sqlx::Error::RowNotFound)));
        let err = StoreError::Connection(sqlx::Error::PoolTimedOut);
        assert!(matches!(err.sqlx_error(), Some(sqlx::Error::PoolTimedOut)));
        assert!(StoreError::NotConnected.sqlx_error().is_none());
    }

    #[test]
    fn test_ingest_error_names_path() {
        let err = IngestError::Open {
            path: std::path::PathBuf::from("/tmp/missing.jsonl"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/tmp/missing.jsonl"));
    }

    #[test]
    fn test_from_sqlx_error_is_sql_variant() {
        let err: StoreError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, StoreError::Sql(sqlx::Error::PoolClosed)));
    }
}
