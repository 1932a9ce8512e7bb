//! bucket_store library: persistence for storage bucket scan results
//!
//! This library writes scanned buckets and their enumerated objects to a
//! relational database (PostgreSQL in production, SQLite for local runs and
//! tests). Each bucket is written atomically: its row is upserted by name and
//! its objects are replaced in batches inside one transaction.
//!
//! # Example
//!
//! ```no_run
//! use bucket_store::{Bucket, BucketExistence, BucketObject, ConnectionManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConnectionManager::new();
//! let db = manager.connect("postgres://scanner@localhost/buckets", true).await?;
//!
//! let bucket = Bucket::new("my-test-bucket", BucketExistence::Exists).with_objects(vec![
//!     BucketObject::new("a.txt", 10),
//!     BucketObject::new("b.txt", 20),
//! ]);
//! let outcome = db.store_bucket(&bucket).await?;
//! println!("{outcome:?}");
//!
//! manager.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod bucket;
pub mod config;
mod error_handling;
pub mod ingest;
pub mod initialization;
pub mod storage;

// Re-export public API
pub use bucket::{Bucket, BucketExistence, BucketObject, BucketPermissions, Permission};
pub use config::{LogFormat, LogLevel, Opt, RetryPolicy, StoreConfig};
pub use error_handling::{
    is_record_not_found, is_retriable_error, IngestError, InitializationError, StoreError,
};
pub use ingest::{ingest_path, ingest_reader, IngestReport};
pub use storage::{
    connect, connect_with, default_manager, disconnect, run_migrations, store_bucket, Backend,
    ConnectionManager, Database, LogQueryLogger, QueryLogger, StoreOutcome,
};
