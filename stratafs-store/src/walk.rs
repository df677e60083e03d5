//! Backend-agnostic recursive traversal.
//!
//! Built purely on the single-level listing primitive, so it works over
//! any [`StorageBackend`]. The walk is depth-first with a directory
//! yielded before its children and no ordering guarantee among siblings.
//! It is lazy and abortable: dropping it mid-stream drops every still-open
//! per-level cursor, releasing backend-side listing state.

use stratafs_common::backend::{BoxedResourceCursor, StorageBackend};
use stratafs_common::entity::{EntityKind, Resource};
use stratafs_common::error::Result;
use stratafs_common::path::StoragePath;

/// Lazy depth-first listing of every descendant of a root.
pub struct RecursiveListing<'a, B: StorageBackend + ?Sized> {
    backend: &'a B,
    // One open cursor per directory level currently being walked.
    stack: Vec<BoxedResourceCursor>,
}

impl<'a, B: StorageBackend + ?Sized> RecursiveListing<'a, B> {
    /// Open a walk over every descendant of `root`.
    ///
    /// A binary root has no descendants and yields the empty sequence.
    pub async fn open(backend: &'a B, root: &StoragePath) -> Result<Self> {
        let stack = match backend.entity_kind(root).await? {
            EntityKind::Binary => Vec::new(),
            EntityKind::Container | EntityKind::Directory => {
                vec![backend.list_resources(root).await?]
            }
        };
        Ok(Self { backend, stack })
    }

    /// Next resource in depth-first order, or `None` once exhausted.
    pub async fn next(&mut self) -> Result<Option<Resource>> {
        while let Some(cursor) = self.stack.last_mut() {
            match cursor.next().await? {
                Some(resource) => {
                    if resource.kind == EntityKind::Directory {
                        self.stack
                            .push(self.backend.list_resources(&resource.path).await?);
                    }
                    return Ok(Some(resource));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        Ok(None)
    }

    /// Drain the rest of the walk into memory.
    pub async fn collect(mut self) -> Result<Vec<Resource>> {
        let mut resources = Vec::new();
        while let Some(resource) = self.next().await? {
            resources.push(resource);
        }
        Ok(resources)
    }
}

/// Number of descendants under `root`.
///
/// Defined as the length of the sequence produced by
/// [`RecursiveListing::open`] on the same root.
pub async fn count_all<B: StorageBackend + ?Sized>(backend: &B, root: &StoragePath) -> Result<u64> {
    let mut walk = RecursiveListing::open(backend, root).await?;
    let mut count = 0;
    while walk.next().await?.is_some() {
        count += 1;
    }
    Ok(count)
}
