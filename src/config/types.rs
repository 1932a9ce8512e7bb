//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DATABASE_URL_ENV, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_STATEMENT_CACHE_CAPACITY, RETRY_INITIAL_DELAY_MS, RETRY_MAX_DELAY_SECS,
    SLOW_QUERY_THRESHOLD,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What to do when a bucket write fails.
///
/// The default is `None`: the error goes straight back to the caller, who
/// decides whether to retry that one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Never retry.
    #[default]
    None,
    /// Retry transient failures with exponential backoff.
    Exponential {
        /// Total attempts including the first one.
        max_attempts: usize,
        /// Delay before the first retry; doubles on each further retry.
        base_delay: Duration,
        /// Upper bound for a single delay.
        max_delay: Duration,
    },
}

impl RetryPolicy {
    /// Exponential policy with the default delays.
    pub fn exponential(max_attempts: usize) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            base_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
        }
    }

    /// Total number of attempts a write gets under this policy.
    pub fn max_attempts(&self) -> usize {
        match self {
            RetryPolicy::None => 1,
            RetryPolicy::Exponential { max_attempts, .. } => (*max_attempts).max(1),
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use bucket_store::StoreConfig;
///
/// let config = StoreConfig {
///     database_url: "postgres://scanner@localhost/buckets".to_string(),
///     run_migrations: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection string (`postgres://...` or `sqlite:...`)
    pub database_url: String,

    /// Apply the bundled schema migrations on connect
    pub run_migrations: bool,

    /// Object rows per INSERT statement
    pub batch_size: usize,

    /// Statements slower than this are logged as warnings
    pub slow_query_threshold: Duration,

    /// Prepared statement cache capacity for PostgreSQL connections
    pub statement_cache_capacity: usize,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// Timeout for acquiring a pooled connection
    pub acquire_timeout: Duration,

    /// Retry behaviour for failed bucket writes
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            run_migrations: false,
            batch_size: DEFAULT_BATCH_SIZE,
            slow_query_threshold: SLOW_QUERY_THRESHOLD,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            retry: RetryPolicy::None,
        }
    }
}

impl StoreConfig {
    /// Configuration for `database_url` with every other field defaulted.
    pub fn new(database_url: impl Into<String>, run_migrations: bool) -> Self {
        Self {
            database_url: database_url.into(),
            run_migrations,
            ..Default::default()
        }
    }
}

/// Command-line options for the `bucket_store` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bucket_store",
    about = "Stores bucket scan results (one JSON bucket per line) in a database."
)]
pub struct Opt {
    /// Database connection string
    #[arg(long, env = DATABASE_URL_ENV)]
    pub db: String,

    /// Create or update the schema before storing
    #[arg(long)]
    pub migrate: bool,

    /// JSON-lines input file, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: PathBuf,

    /// Object rows per INSERT statement
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Maximum pooled connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Attempts per bucket write; 1 disables retries
    #[arg(long, default_value_t = 1)]
    pub retry_attempts: usize,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Opt {
    /// Builds the library configuration from parsed options.
    pub fn store_config(&self) -> StoreConfig {
        let retry = if self.retry_attempts > 1 {
            RetryPolicy::exponential(self.retry_attempts)
        } else {
            RetryPolicy::None
        };
        StoreConfig {
            database_url: self.db.clone(),
            run_migrations: self.migrate,
            batch_size: self.batch_size,
            max_connections: self.max_connections,
            retry,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.slow_query_threshold, Duration::from_secs(3600));
        assert_eq!(config.statement_cache_capacity, 0);
        assert_eq!(config.retry, RetryPolicy::None);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_retry_policy_attempts() {
        assert_eq!(RetryPolicy::None.max_attempts(), 1);
        assert_eq!(RetryPolicy::exponential(4).max_attempts(), 4);
        assert_eq!(RetryPolicy::exponential(0).max_attempts(), 1);
    }

    #[test]
    fn test_opt_store_config() {
        let opt = Opt::parse_from([
            "bucket_store",
            "--db",
            "sqlite::memory:",
            "--migrate",
            "--batch-size",
            "250",
            "--retry-attempts",
            "3",
        ]);
        let config = opt.store_config();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.run_migrations);
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.retry.max_attempts(), 3);
    }

    #[test]
    fn test_opt_single_attempt_disables_retry() {
        let opt = Opt::parse_from(["bucket_store", "--db", "sqlite::memory:"]);
        assert_eq!(opt.store_config().retry, RetryPolicy::None);
        assert_eq!(opt.input, PathBuf::from("-"));
    }
}
