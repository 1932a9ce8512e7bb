//! Bucket scan result types.
//!
//! A `Bucket` is the aggregate produced by the scanner for one storage bucket.
//! It owns its `BucketObject`s; the storage layer writes both together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// Whether a scanned bucket exists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIterMacro,
)]
#[serde(rename_all = "snake_case")]
pub enum BucketExistence {
    /// The provider confirmed the bucket exists.
    Exists,
    /// The provider reported that no bucket with this name exists.
    DoesNotExist,
    /// The scan could not determine existence.
    #[default]
    Unknown,
}

impl BucketExistence {
    /// Integer code stored in the `existence` column.
    pub fn code(self) -> i64 {
        match self {
            BucketExistence::DoesNotExist => 0,
            BucketExistence::Exists => 1,
            BucketExistence::Unknown => 2,
        }
    }

    /// Inverse of [`BucketExistence::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(BucketExistence::DoesNotExist),
            1 => Some(BucketExistence::Exists),
            2 => Some(BucketExistence::Unknown),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            BucketExistence::Exists => "exists",
            BucketExistence::DoesNotExist => "does not exist",
            BucketExistence::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BucketExistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing a single bucket permission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIterMacro,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// The permission is granted.
    Allowed,
    /// The permission is denied.
    Denied,
    /// The permission was not checked or the check was inconclusive.
    #[default]
    Unknown,
}

impl Permission {
    /// Integer code stored in the `perm_*` columns.
    pub fn code(self) -> i64 {
        match self {
            Permission::Denied => 0,
            Permission::Allowed => 1,
            Permission::Unknown => 2,
        }
    }

    /// Inverse of [`Permission::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Permission::Denied),
            1 => Some(Permission::Allowed),
            2 => Some(Permission::Unknown),
            _ => None,
        }
    }
}

/// Column names of the permission flags, in the order of
/// [`BucketPermissions::codes`].
pub(crate) const PERMISSION_COLUMNS: [&str; 10] = [
    "perm_auth_users_read",
    "perm_auth_users_write",
    "perm_auth_users_read_acl",
    "perm_auth_users_write_acl",
    "perm_auth_users_full_control",
    "perm_all_users_read",
    "perm_all_users_write",
    "perm_all_users_read_acl",
    "perm_all_users_write_acl",
    "perm_all_users_full_control",
];

/// Access permissions discovered for a bucket.
///
/// "Authenticated users" means any principal holding valid credentials for the
/// provider; "all users" means anonymous access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketPermissions {
    /// List objects as an authenticated user.
    pub auth_users_read: Permission,
    /// Write objects as an authenticated user.
    pub auth_users_write: Permission,
    /// Read the bucket ACL as an authenticated user.
    pub auth_users_read_acl: Permission,
    /// Modify the bucket ACL as an authenticated user.
    pub auth_users_write_acl: Permission,
    /// Full control as an authenticated user.
    pub auth_users_full_control: Permission,
    /// List objects anonymously.
    pub all_users_read: Permission,
    /// Write objects anonymously.
    pub all_users_write: Permission,
    /// Read the bucket ACL anonymously.
    pub all_users_read_acl: Permission,
    /// Modify the bucket ACL anonymously.
    pub all_users_write_acl: Permission,
    /// Full control anonymously.
    pub all_users_full_control: Permission,
}

impl BucketPermissions {
    /// Codes in [`PERMISSION_COLUMNS`] order.
    pub(crate) fn codes(&self) -> [i64; 10] {
        [
            self.auth_users_read.code(),
            self.auth_users_write.code(),
            self.auth_users_read_acl.code(),
            self.auth_users_write_acl.code(),
            self.auth_users_full_control.code(),
            self.all_users_read.code(),
            self.all_users_write.code(),
            self.all_users_read_acl.code(),
            self.all_users_write_acl.code(),
            self.all_users_full_control.code(),
        ]
    }

    /// Rebuilds permissions from stored codes. Unrecognized codes map to `Unknown`.
    pub(crate) fn from_codes(codes: [i64; 10]) -> Self {
        let p = |i: usize| Permission::from_code(codes[i]).unwrap_or_default();
        BucketPermissions {
            auth_users_read: p(0),
            auth_users_write: p(1),
            auth_users_read_acl: p(2),
            auth_users_write_acl: p(3),
            auth_users_full_control: p(4),
            all_users_read: p(5),
            all_users_write: p(6),
            all_users_read_acl: p(7),
            all_users_write_acl: p(8),
            all_users_full_control: p(9),
        }
    }

    /// True when any anonymous permission is granted.
    pub fn is_public(&self) -> bool {
        [
            self.all_users_read,
            self.all_users_write,
            self.all_users_read_acl,
            self.all_users_write_acl,
            self.all_users_full_control,
        ]
        .contains(&Permission::Allowed)
    }
}

/// One object enumerated inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketObject {
    /// Object key (path inside the bucket).
    pub key: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Last modification time reported by the provider.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl BucketObject {
    /// Creates an object without a modification time.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        BucketObject {
            key: key.into(),
            size,
            last_modified: None,
        }
    }
}

/// One scanned storage bucket and the objects enumerated in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket name, unique per store.
    pub name: String,
    /// Provider region, empty when unknown.
    #[serde(default)]
    pub region: String,
    /// Storage provider the bucket was found on (e.g. `aws`, `gcp`).
    #[serde(default)]
    pub provider: String,
    /// Existence status determined by the scan.
    #[serde(default)]
    pub existence: BucketExistence,
    /// When the scan observed the bucket.
    #[serde(default = "Utc::now")]
    pub date_scanned: DateTime<Utc>,
    /// Discovered access permissions.
    #[serde(default)]
    pub permissions: BucketPermissions,
    /// Canonical owner id, when the ACL could be read.
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Owner display name, when the ACL could be read.
    #[serde(default)]
    pub owner_display_name: Option<String>,
    /// Whether `objects` holds a complete listing.
    #[serde(default)]
    pub objects_enumerated: bool,
    /// Enumerated objects.
    #[serde(default)]
    pub objects: Vec<BucketObject>,
}

impl Bucket {
    /// Creates a bucket scanned now, with unknown permissions and no objects.
    pub fn new(name: impl Into<String>, existence: BucketExistence) -> Self {
        Bucket {
            name: name.into(),
            region: String::new(),
            provider: String::new(),
            existence,
            date_scanned: Utc::now(),
            permissions: BucketPermissions::default(),
            owner_id: None,
            owner_display_name: None,
            objects_enumerated: false,
            objects: Vec::new(),
        }
    }

    /// Replaces the object listing and marks it as enumerated.
    pub fn with_objects(mut self, objects: Vec<BucketObject>) -> Self {
        self.objects = objects;
        self.objects_enumerated = true;
        self
    }

    /// Buckets known not to exist carry nothing worth storing.
    pub fn is_persistable(&self) -> bool {
        self.existence != BucketExistence::DoesNotExist
    }

    /// Sum of object sizes, saturating at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.objects
            .iter()
            .fold(0u64, |acc, obj| acc.saturating_add(obj.size))
    }
}
