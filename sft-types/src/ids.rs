//! Identity types for containers and blobs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 64-bit container identifier assigned by the server.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(i64);

impl ContainerId {
    /// Wrap a raw container ID.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ContainerId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerId({})", self.0)
    }
}

/// A blob identifier issued by the server when a blob entry is created.
///
/// The client only ever holds this reference, never the server's record.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    /// Wrap a server-issued blob ID, stripping any JSON quoting.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim().trim_matches('"');
        if trimmed.len() == value.len() {
            Self(value)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Borrow the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.0)
    }
}

/// Reference to a blob created during an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    /// Container the blob belongs to.
    pub container_id: ContainerId,
    /// Server-issued blob ID.
    pub blob_id: BlobId,
    /// Display name given at creation.
    pub name: String,
}
