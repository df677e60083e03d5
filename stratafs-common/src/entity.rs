//! Entities stored behind the capability interface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path::StoragePath;
use crate::payload::ContentPayload;

/// What kind of entity lives at a path.
///
/// Not derivable from path shape alone: a path of two or more segments may
/// hold either a directory or a binary, so resolving the kind takes a
/// backend round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Container,
    Directory,
    Binary,
}

/// A (path, kind) pair, the unit produced by listings and traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub path: StoragePath,
    pub kind: EntityKind,
}

impl Resource {
    pub fn new(path: StoragePath, kind: EntityKind) -> Self {
        Self { path, kind }
    }
}

/// Root namespace unit; always addressed by a single-segment path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub path: StoragePath,
}

/// Non-leaf node nested under a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub path: StoragePath,
}

/// Leaf node holding content.
#[derive(Debug, Clone)]
pub struct Binary {
    pub path: StoragePath,
    pub size: u64,
    /// Hex SHA-256 of the content, when the backend recorded one.
    pub sha256: Option<String>,
    pub content: ContentPayload,
}

/// An immutable snapshot of a binary at a point in its history.
///
/// History is append-only: reverting to a version rewrites the binary's
/// current state but never removes snapshots. Only an explicit delete of a
/// specific version prunes history.
#[derive(Debug, Clone)]
pub struct BinaryVersion {
    /// Identifier unique within the binary's history.
    pub id: String,
    pub created: DateTime<Utc>,
    /// Free-form annotations recorded when the snapshot was taken.
    pub properties: BTreeMap<String, String>,
    /// The snapshotted content and metadata.
    pub binary: Binary,
}
