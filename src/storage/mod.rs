//! Database operations.
//!
//! Connection lifecycle, schema migrations, the transactional bucket writer,
//! read queries and query logging.

mod connection;
mod insert;
mod migrations;
mod pool;
mod query;
pub mod query_log;
mod retry;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use connection::{
    connect, connect_with, default_manager, disconnect, store_bucket, ConnectionManager, Database,
};
pub use insert::StoreOutcome;
pub use migrations::run_migrations;
pub use pool::Backend;
pub use query_log::{LogQueryLogger, QueryLogger, QueryTracer};
