//! The capability contract every storage backend implements.
//!
//! Each backend handles the raw I/O for one persistence engine (local
//! filesystem, remote content repository, object store). Collaborators
//! hold a `&dyn StorageBackend` and never a concrete backend type or a
//! backend-native client. Backends normalize their native failures to
//! [`StorageError`](crate::error::StorageError) at this boundary; the
//! engines layered above do not invent new error kinds.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::entity::{Binary, BinaryVersion, Container, Directory, EntityKind, Resource};
use crate::error::Result;
use crate::path::StoragePath;
use crate::payload::ContentPayload;

/// A lazy listing handle.
///
/// Cursors are per-call resources: never shared across calls or threads,
/// and any backend-side listing state (open connections, result pages) is
/// released when the cursor is dropped, including when the consumer stops
/// early.
#[async_trait]
pub trait ResourceCursor: Send {
    /// Next resource, or `None` once the listing is exhausted.
    async fn next(&mut self) -> Result<Option<Resource>>;
}

/// Boxed cursor returned by listing operations.
pub type BoxedResourceCursor = Box<dyn ResourceCursor>;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stable identity of the physical store behind this handle.
    ///
    /// Two backends reporting equal ids reach the same store. The transfer
    /// engine queries this to decide whether the native copy/move hooks
    /// may apply.
    fn instance_id(&self) -> &str;

    /// List every container in the store. The cursor is fresh per call.
    async fn list_containers(&self) -> Result<BoxedResourceCursor>;

    /// Fails `RequestInvalid` unless the path has exactly one segment, and
    /// `AlreadyExists` when the container is already there.
    async fn create_container(&self, path: &StoragePath) -> Result<Container>;

    /// Fails `RequestInvalid` unless the path has exactly one segment.
    async fn get_container(&self, path: &StoragePath) -> Result<Container>;

    /// Delete a container and all of its descendants.
    async fn delete_container(&self, path: &StoragePath) -> Result<()>;

    /// Create a directory. Missing intermediate parents are created
    /// implicitly; an occupied leaf fails `AlreadyExists`.
    async fn create_directory(&self, path: &StoragePath) -> Result<Directory>;

    /// Fails `RequestInvalid` when the path is a container path or
    /// resolves to a binary, `NotFound` when nothing is there.
    async fn get_directory(&self, path: &StoragePath) -> Result<Directory>;

    /// One level of children under a container or directory. Recursive
    /// listings are built on this primitive by the traversal engine.
    async fn list_resources(&self, path: &StoragePath) -> Result<BoxedResourceCursor>;

    /// Number of immediate children under a container or directory.
    async fn count_resources(&self, path: &StoragePath) -> Result<u64>;

    /// Fails `AlreadyExists` when the path is occupied and `NotFound` when
    /// the container the path belongs to does not exist.
    async fn create_binary(&self, path: &StoragePath, payload: &ContentPayload) -> Result<Binary>;

    /// Fails `RequestInvalid` when the path holds a directory.
    async fn get_binary(&self, path: &StoragePath) -> Result<Binary>;

    /// Replace a binary's content in place. With `create_if_missing`, an
    /// absent binary is created instead of failing `NotFound`.
    async fn update_binary(
        &self,
        path: &StoragePath,
        payload: &ContentPayload,
        create_if_missing: bool,
    ) -> Result<Binary>;

    /// Delete a directory (with its descendants) or a binary.
    async fn delete_resource(&self, path: &StoragePath) -> Result<()>;

    /// Resolve what kind of entity lives at `path`, failing `NotFound`
    /// when nothing does.
    async fn entity_kind(&self, path: &StoragePath) -> Result<EntityKind>;

    /// Versions of a binary, newest first.
    async fn list_versions(&self, path: &StoragePath) -> Result<Vec<BinaryVersion>>;

    async fn get_version(&self, path: &StoragePath, version_id: &str) -> Result<BinaryVersion>;

    /// Snapshot the binary's current content as a new version under a
    /// fresh identifier.
    async fn create_version(
        &self,
        path: &StoragePath,
        properties: BTreeMap<String, String>,
    ) -> Result<BinaryVersion>;

    /// Make the named version's content the binary's current state.
    /// History is left untouched.
    async fn revert_to_version(&self, path: &StoragePath, version_id: &str) -> Result<()>;

    /// Prune exactly one snapshot from the binary's history.
    async fn delete_version(&self, path: &StoragePath, version_id: &str) -> Result<()>;

    /// Native copy within the same physical store. `Ok(false)` means the
    /// backend has no native primitive and the caller falls back to the
    /// generic walk. Only consulted when source and destination report the
    /// same [`instance_id`](Self::instance_id).
    async fn try_native_copy(&self, _from: &StoragePath, _to: &StoragePath) -> Result<bool> {
        Ok(false)
    }

    /// Native (possibly atomic) move within the same physical store; same
    /// contract as [`try_native_copy`](Self::try_native_copy).
    async fn try_native_move(&self, _from: &StoragePath, _to: &StoragePath) -> Result<bool> {
        Ok(false)
    }
}
