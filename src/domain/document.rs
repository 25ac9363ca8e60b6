//! Document records handed to the analysis pipeline by the document store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Opaque, unique identifier of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Wraps a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for DocumentId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to the account that uploaded a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Wraps a raw owner identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw owner identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// An uploaded image document.
///
/// The pipeline only reads `path`; the remaining fields are carried for callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique id assigned by the store.
    pub id: DocumentId,
    /// Location of the uploaded image.
    pub path: PathBuf,
    /// Account that uploaded the document.
    pub owner: OwnerId,
    /// Upload time.
    pub created_at: SystemTime,
}

impl Document {
    /// Creates a document record stamped with the current time.
    pub fn new(id: DocumentId, path: impl Into<PathBuf>, owner: OwnerId) -> Self {
        Self {
            id,
            path: path.into(),
            owner,
            created_at: SystemTime::now(),
        }
    }

    /// Returns the image path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
