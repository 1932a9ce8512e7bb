//! Storage configuration and constants.
//!
//! This module provides:
//! - Default values (batch size, slow-query threshold, pool sizing)
//! - `StoreConfig`, the library configuration
//! - CLI option types

mod constants;
mod types;

pub use constants::*;
pub use types::{LogFormat, LogLevel, Opt, RetryPolicy, StoreConfig};
