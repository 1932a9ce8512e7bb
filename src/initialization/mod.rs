//! Process-level initialization.
//!
//! Database setup lives in [`crate::storage`]; this module only covers what
//! the command-line entry point configures before touching the database.

mod logger;

pub use logger::init_logger_with;
