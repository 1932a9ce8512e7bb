//! Scanned bucket model.

mod types;

pub use types::{Bucket, BucketExistence, BucketObject, BucketPermissions, Permission};
pub(crate) use types::PERMISSION_COLUMNS;
