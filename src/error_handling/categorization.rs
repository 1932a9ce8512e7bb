//! Error categorization.
//!
//! Decides which database errors are expected absences and which are worth
//! retrying.

use sqlx::sqlite::SqliteError;

use super::types::StoreError;

/// PostgreSQL SQLSTATE codes for failures that may succeed on a second try.
const RETRIABLE_PG_CODES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "57P01", // admin_shutdown
    "08000", // connection_exception
    "08003", // connection_does_not_exist
    "08006", // connection_failure
];

/// SQLite primary result codes SQLITE_BUSY and SQLITE_LOCKED.
const RETRIABLE_SQLITE_CODES: &[i32] = &[5, 6];

/// Returns true when the error means "no row matched".
///
/// A lookup that finds nothing is a normal outcome, not a failure, and is
/// never logged at error level.
pub fn is_record_not_found(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::RowNotFound)
}

/// Determines if a database error is transient (should be retried).
///
/// # Retriable Errors
///
/// - I/O failures and pool acquisition timeouts
/// - PostgreSQL serialization failures, deadlocks and dropped connections
/// - SQLite busy / locked
///
/// # Non-Retriable Errors
///
/// - Constraint violations and every other database error
/// - Decode, configuration and protocol errors
pub fn is_retriable_error(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => {
            let Some(code) = db_err.code() else {
                return false;
            };
            if db_err.try_downcast_ref::<SqliteError>().is_some() {
                // Extended result codes carry the primary code in the low byte.
                code.parse::<i32>()
                    .map(|c| RETRIABLE_SQLITE_CODES.contains(&(c & 0xff)))
                    .unwrap_or(false)
            } else {
                RETRIABLE_PG_CODES.contains(&code.as_ref())
            }
        }
        _ => false,
    }
}

/// `is_retriable_error` lifted to `StoreError`; only database errors qualify.
pub(crate) fn is_retriable_store_error(error: &StoreError) -> bool {
    error.sqlx_error().is_some_and(is_retriable_error)
}
