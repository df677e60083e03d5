//! Convenience surface over any backend.
//!
//! [`StorageBackendExt`] adds the recursive forms of the listing
//! operations, random-id creation, and direct-access staging as methods on
//! every [`StorageBackend`] through a blanket implementation, so callers
//! holding a `&dyn StorageBackend` get the whole capability surface in one
//! place. The engines remain available as free functions for callers that
//! want the lazy primitives.

use std::collections::BTreeMap;

use async_trait::async_trait;

use stratafs_common::backend::StorageBackend;
use stratafs_common::entity::{Binary, BinaryVersion, Directory, Resource};
use stratafs_common::error::Result;
use stratafs_common::path::StoragePath;
use stratafs_common::payload::ContentPayload;

use crate::random;
use crate::staging::{self, DirectAccess};
use crate::walk::{self, RecursiveListing};

#[async_trait]
pub trait StorageBackendExt: StorageBackend {
    /// Children of `path`: one level, or the whole subtree depth-first.
    ///
    /// Collects into memory; use [`StorageBackend::list_resources`] or
    /// [`RecursiveListing`] directly for lazy consumption.
    async fn list_resources_under(
        &self,
        path: &StoragePath,
        recursive: bool,
    ) -> Result<Vec<Resource>> {
        if recursive {
            RecursiveListing::open(self, path).await?.collect().await
        } else {
            let mut cursor = self.list_resources(path).await?;
            let mut resources = Vec::new();
            while let Some(resource) = cursor.next().await? {
                resources.push(resource);
            }
            Ok(resources)
        }
    }

    /// Number of children under `path`, one level or the whole subtree.
    async fn count_resources_under(&self, path: &StoragePath, recursive: bool) -> Result<u64> {
        if recursive {
            walk::count_all(self, path).await
        } else {
            self.count_resources(path).await
        }
    }

    /// Create a directory with a random name under `parent`; see
    /// [`random::create_random_directory`].
    async fn create_random_directory(&self, parent: &StoragePath) -> Result<Directory> {
        random::create_random_directory(self, parent).await
    }

    /// Create a binary with a random name under `parent`; see
    /// [`random::create_random_binary`].
    async fn create_random_binary(
        &self,
        parent: &StoragePath,
        payload: &ContentPayload,
    ) -> Result<Binary> {
        random::create_random_binary(self, parent, payload).await
    }

    /// Snapshot a binary without annotations; shorthand for
    /// [`StorageBackend::create_version`] with empty properties.
    async fn snapshot(&self, path: &StoragePath) -> Result<BinaryVersion> {
        self.create_version(path, BTreeMap::new()).await
    }

    /// Materialize the entity at `path` into a temporary local location;
    /// see [`staging::direct_access`].
    async fn direct_access(&self, path: &StoragePath) -> Result<DirectAccess> {
        staging::direct_access(self, path).await
    }
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackendExt for B {}
