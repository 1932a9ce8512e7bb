//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `bucket_store` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use bucket_store::initialization::init_logger_with;
use bucket_store::{ingest_path, ConnectionManager, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let manager = ConnectionManager::new();
    let db = match manager.connect_with(opt.store_config()).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("bucket_store error: {:#}", anyhow::Error::new(e));
            process::exit(1);
        }
    };

    let result = ingest_path(&db, &opt.input)
        .await
        .with_context(|| format!("Failed to ingest {}", opt.input.display()));
    manager.disconnect().await;

    match result {
        Ok(report) => {
            println!(
                "Processed {} bucket{} ({} stored, {} skipped, {} failed, {} objects written)",
                report.read,
                if report.read == 1 { "" } else { "s" },
                report.stored,
                report.skipped,
                report.failed,
                report.objects_written
            );
            if !report.is_clean() {
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("bucket_store error: {:#}", e);
            process::exit(1);
        }
    }
}
