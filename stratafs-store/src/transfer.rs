//! Copy and move of subtrees between backends.
//!
//! The generic walk works across any two backends: structural recursion
//! over single-level listings plus content streaming through
//! [`ContentPayload`]. When source and destination report the same
//! physical store, the backend's native copy/move hooks are consulted
//! first; the walk is the backend-independent fallback.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use stratafs_common::backend::StorageBackend;
use stratafs_common::entity::EntityKind;
use stratafs_common::error::{Result, StorageError};
use stratafs_common::path::StoragePath;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Overwrite an occupied destination binary instead of failing
    /// `AlreadyExists`.
    pub overwrite: bool,
    /// Keep copying the remaining siblings when one child fails, instead
    /// of aborting on the first failure. Failed children are logged and
    /// already-copied entries are left in place either way.
    pub best_effort: bool,
}

/// Copy the entity at `from_path` (and, for containers and directories,
/// every descendant) onto `to_path`.
///
/// There is no multi-entity transaction: a failure partway leaves
/// already-created destination entries in place. Callers needing an atomic
/// appearance should copy under a temporary path and commit by move.
pub async fn copy<S, D>(
    from: &S,
    from_path: &StoragePath,
    to: &D,
    to_path: &StoragePath,
    options: TransferOptions,
) -> Result<()>
where
    S: StorageBackend + ?Sized,
    D: StorageBackend + ?Sized,
{
    check_disjoint(from, from_path, to, to_path)?;
    let kind = from.entity_kind(from_path).await?;

    if from.instance_id() == to.instance_id() && !options.overwrite {
        if to.try_native_copy(from_path, to_path).await? {
            debug!(from = %from_path, to = %to_path, "copy handled natively");
            return Ok(());
        }
    }

    copy_entity(from, from_path, to, to_path, kind, options).await
}

/// Move the entity at `from_path` onto `to_path`: copy, then delete the
/// source subtree. Not atomic across backends; within one backend the
/// native move hook (typically an atomic rename) is consulted first.
pub async fn move_resource<S, D>(
    from: &S,
    from_path: &StoragePath,
    to: &D,
    to_path: &StoragePath,
    options: TransferOptions,
) -> Result<()>
where
    S: StorageBackend + ?Sized,
    D: StorageBackend + ?Sized,
{
    check_disjoint(from, from_path, to, to_path)?;
    let kind = from.entity_kind(from_path).await?;

    if from.instance_id() == to.instance_id() && !options.overwrite {
        if to.try_native_move(from_path, to_path).await? {
            debug!(from = %from_path, to = %to_path, "move handled natively");
            return Ok(());
        }
    }

    copy_entity(from, from_path, to, to_path, kind, options).await?;
    match kind {
        EntityKind::Container => from.delete_container(from_path).await,
        EntityKind::Directory | EntityKind::Binary => from.delete_resource(from_path).await,
    }
}

/// A transfer within one store must not target the source subtree.
fn check_disjoint<S, D>(
    from: &S,
    from_path: &StoragePath,
    to: &D,
    to_path: &StoragePath,
) -> Result<()>
where
    S: StorageBackend + ?Sized,
    D: StorageBackend + ?Sized,
{
    if from.instance_id() == to.instance_id()
        && (from_path == to_path || from_path.is_ancestor_of(to_path))
    {
        return Err(StorageError::RequestInvalid(format!(
            "destination \"{to_path}\" lies inside the source \"{from_path}\""
        )));
    }
    Ok(())
}

fn copy_entity<'a, S, D>(
    from: &'a S,
    from_path: &'a StoragePath,
    to: &'a D,
    to_path: &'a StoragePath,
    kind: EntityKind,
    options: TransferOptions,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>
where
    S: StorageBackend + ?Sized,
    D: StorageBackend + ?Sized,
{
    Box::pin(async move {
        match kind {
            EntityKind::Binary => {
                let binary = from.get_binary(from_path).await?;
                if options.overwrite {
                    to.update_binary(to_path, &binary.content, true).await?;
                } else {
                    to.create_binary(to_path, &binary.content).await?;
                }
                Ok(())
            }
            EntityKind::Container | EntityKind::Directory => {
                create_tree_node(to, to_path).await?;
                let mut children = from.list_resources(from_path).await?;
                while let Some(child) = children.next().await? {
                    let child_dest = to_path.child(child.path.name())?;
                    match copy_entity(from, &child.path, to, &child_dest, child.kind, options).await
                    {
                        Ok(()) => {}
                        Err(err) if options.best_effort => {
                            warn!(
                                child = %child.path,
                                error = %err,
                                "continuing copy after child failure"
                            );
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(())
            }
        }
    })
}

/// Create the destination node for a subtree copy. An existing node is
/// reused, so copying into an occupied tree merges children; binaries
/// below still conflict individually.
async fn create_tree_node<D>(to: &D, to_path: &StoragePath) -> Result<()>
where
    D: StorageBackend + ?Sized,
{
    let created = if to_path.is_container() {
        to.create_container(to_path).await.map(|_| ())
    } else {
        to.create_directory(to_path).await.map(|_| ())
    };
    match created {
        Ok(()) => Ok(()),
        Err(StorageError::AlreadyExists(_)) => Ok(()),
        Err(err) => Err(err),
    }
}
