//! Tests for command-line option parsing.

use std::path::PathBuf;

use bucket_store::config::{DATABASE_URL_ENV, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONNECTIONS};
use bucket_store::{LogFormat, LogLevel, Opt, RetryPolicy};
use clap::Parser;

#[test]
fn test_defaults() {
    let opt = Opt::try_parse_from(["bucket_store", "--db", "sqlite:scan.db"]).unwrap();

    assert_eq!(opt.db, "sqlite:scan.db");
    assert!(!opt.migrate);
    assert_eq!(opt.input, PathBuf::from("-"));
    assert_eq!(opt.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(opt.max_connections, DEFAULT_MAX_CONNECTIONS);
    assert!(matches!(opt.log_level, LogLevel::Info));
    assert!(matches!(opt.log_format, LogFormat::Plain));
    assert_eq!(opt.store_config().retry, RetryPolicy::None);
}

#[test]
fn test_all_flags() {
    let opt = Opt::try_parse_from([
        "bucket_store",
        "--db",
        "postgres://scanner@localhost/buckets",
        "--migrate",
        "--input",
        "scan.jsonl",
        "--batch-size",
        "250",
        "--max-connections",
        "12",
        "--retry-attempts",
        "4",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .unwrap();

    assert!(opt.migrate);
    assert_eq!(opt.input, PathBuf::from("scan.jsonl"));
    assert!(matches!(opt.log_level, LogLevel::Debug));
    assert!(matches!(opt.log_format, LogFormat::Json));

    let config = opt.store_config();
    assert_eq!(config.database_url, "postgres://scanner@localhost/buckets");
    assert!(config.run_migrations);
    assert_eq!(config.batch_size, 250);
    assert_eq!(config.max_connections, 12);
    assert_eq!(config.retry.max_attempts(), 4);
}

#[test]
fn test_missing_db_is_rejected() {
    if std::env::var_os(DATABASE_URL_ENV).is_some() {
        // The environment supplies the value.
        return;
    }
    assert!(Opt::try_parse_from(["bucket_store"]).is_err());
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(Opt::try_parse_from(["bucket_store", "--db", "x:y", "--batch-size", "many"]).is_err());
    assert!(
        Opt::try_parse_from(["bucket_store", "--db", "x:y", "--log-format", "xml"]).is_err()
    );
}
