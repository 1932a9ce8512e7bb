//! Configuration constants.
//!
//! Defaults for the storage layer: batching, pooling, query logging and retries.

use std::time::Duration;

/// Maximum number of object rows written by a single INSERT statement.
/// 1000 rows x 4 columns stays far below the bind-parameter limits of both
/// PostgreSQL (65535) and SQLite (32766).
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Statements slower than this are logged at warning level.
/// Deliberately generous: it flags pathological statements only.
pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(60 * 60);

/// Server-side prepared statement cache capacity for PostgreSQL connections.
/// Zero keeps every statement unnamed so transaction-mode poolers work.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 0;

/// Maximum pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long to wait for a pooled connection before failing.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial delay between write retries, in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 100;
/// Upper bound on a single retry delay, in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 5;

/// Logged SQL is cut to this many characters.
/// Batched inserts carry thousands of placeholders otherwise.
pub const MAX_LOGGED_SQL_LENGTH: usize = 512;

/// Environment variable consulted for the connection string.
pub const DATABASE_URL_ENV: &str = "BUCKET_STORE_DB";
