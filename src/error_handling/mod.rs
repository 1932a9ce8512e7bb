//! Error handling.
//!
//! This module provides:
//! - Error type definitions for storage and initialization
//! - Classification of database errors (expected absence, retriable)

mod categorization;
mod types;

// Re-export public API
pub use categorization::{is_record_not_found, is_retriable_error};
pub(crate) use categorization::is_retriable_store_error;
pub use types::{IngestError, InitializationError, StoreError};
