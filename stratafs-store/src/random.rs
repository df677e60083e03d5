//! Collision-safe creation under random leaf identifiers.
//!
//! When the caller does not supply a leaf name, one is drawn at random and
//! creation is attempted optimistically. An `AlreadyExists` answer means
//! the draw collided; a fresh identifier is drawn and the attempt retried.
//! Collisions are practically impossible with v4 UUIDs, so the retry loop
//! is bounded: exhausting it signals a misbehaving store.

use tracing::warn;
use uuid::Uuid;

use stratafs_common::backend::StorageBackend;
use stratafs_common::entity::{Binary, Directory, EntityKind};
use stratafs_common::error::{Result, StorageError};
use stratafs_common::path::StoragePath;
use stratafs_common::payload::ContentPayload;

const MAX_ATTEMPTS: u32 = 8;

/// Create a directory with a random name under `parent`.
pub async fn create_random_directory<B>(backend: &B, parent: &StoragePath) -> Result<Directory>
where
    B: StorageBackend + ?Sized,
{
    create_directory_with(backend, parent, &mut || Uuid::new_v4().to_string()).await
}

/// Create a binary with a random name under `parent`.
pub async fn create_random_binary<B>(
    backend: &B,
    parent: &StoragePath,
    payload: &ContentPayload,
) -> Result<Binary>
where
    B: StorageBackend + ?Sized,
{
    create_binary_with(backend, parent, payload, &mut || {
        Uuid::new_v4().to_string()
    })
    .await
}

/// The parent must already exist and be able to hold children.
async fn check_parent<B>(backend: &B, parent: &StoragePath) -> Result<()>
where
    B: StorageBackend + ?Sized,
{
    match backend.entity_kind(parent).await? {
        EntityKind::Container | EntityKind::Directory => Ok(()),
        EntityKind::Binary => Err(StorageError::RequestInvalid(format!(
            "\"{parent}\" is a binary and cannot hold children"
        ))),
    }
}

async fn create_directory_with<B>(
    backend: &B,
    parent: &StoragePath,
    next_id: &mut (dyn FnMut() -> String + Send),
) -> Result<Directory>
where
    B: StorageBackend + ?Sized,
{
    check_parent(backend, parent).await?;
    let mut last_collision = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let path = parent.child(next_id())?;
        match backend.create_directory(&path).await {
            Ok(directory) => return Ok(directory),
            Err(StorageError::AlreadyExists(reason)) => {
                warn!(path = %path, attempt, "random directory id collided");
                last_collision = Some(reason);
            }
            Err(err) => return Err(err),
        }
    }
    Err(give_up(parent, last_collision))
}

async fn create_binary_with<B>(
    backend: &B,
    parent: &StoragePath,
    payload: &ContentPayload,
    next_id: &mut (dyn FnMut() -> String + Send),
) -> Result<Binary>
where
    B: StorageBackend + ?Sized,
{
    check_parent(backend, parent).await?;
    let mut last_collision = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let path = parent.child(next_id())?;
        match backend.create_binary(&path, payload).await {
            Ok(binary) => return Ok(binary),
            Err(StorageError::AlreadyExists(reason)) => {
                warn!(path = %path, attempt, "random binary id collided");
                last_collision = Some(reason);
            }
            Err(err) => return Err(err),
        }
    }
    Err(give_up(parent, last_collision))
}

fn give_up(parent: &StoragePath, last_collision: Option<String>) -> StorageError {
    StorageError::generic(
        format!("giving up after {MAX_ATTEMPTS} random-id collisions under \"{parent}\""),
        StorageError::AlreadyExists(last_collision.unwrap_or_default()),
    )
}
