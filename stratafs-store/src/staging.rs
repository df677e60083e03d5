//! Direct local access to stored entities.
//!
//! Callers that need a native filesystem path (external tools, format
//! probes) get one by materializing the entity into a temporary location.
//! The staged copy lives exactly as long as the [`DirectAccess`] handle:
//! dropping it deletes the temporary path on every exit path, including
//! when the caller read only part of the content or bailed on an error.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use stratafs_common::backend::StorageBackend;
use stratafs_common::entity::EntityKind;
use stratafs_common::error::{Result, StorageError};
use stratafs_common::path::StoragePath;

use crate::backend::fs::FsBackend;
use crate::transfer::{self, TransferOptions};

/// Scoped handle over a staged local copy of an entity.
pub struct DirectAccess {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl DirectAccess {
    /// Local filesystem location of the staged copy: a directory for
    /// containers and directories, a file for binaries.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged copy now and report any cleanup failure.
    /// Dropping the handle cleans up as well, silently.
    pub fn close(mut self) -> Result<()> {
        if let Some(temp) = self.temp.take() {
            temp.close()
                .map_err(|e| StorageError::generic("removing staged copy", e))?;
        }
        Ok(())
    }
}

/// Materialize the entity at `path` into a fresh temporary location.
///
/// Containers and directories are staged by running the transfer engine
/// against a throwaway local backend; binaries are streamed into a file
/// named after the path's last segment.
pub async fn direct_access<B>(backend: &B, path: &StoragePath) -> Result<DirectAccess>
where
    B: StorageBackend + ?Sized,
{
    let kind = backend.entity_kind(path).await?;
    let temp =
        tempfile::tempdir().map_err(|e| StorageError::generic("creating staging directory", e))?;

    let local = match kind {
        EntityKind::Container | EntityKind::Directory => {
            let stage = FsBackend::open(temp.path())?;
            transfer::copy(backend, path, &stage, path, TransferOptions::default()).await?;
            stage.local_path(path)
        }
        EntityKind::Binary => {
            let binary = backend.get_binary(path).await?;
            let dest = temp.path().join(path.name());
            let mut reader = binary.content.reader().await?;
            let mut file = tokio::fs::File::create(&dest)
                .await
                .map_err(|e| StorageError::from_io(format!("staging \"{path}\""), e))?;
            tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|e| StorageError::from_io(format!("staging \"{path}\""), e))?;
            dest
        }
    };

    debug!(entity = %path, staged = %local.display(), "entity staged for direct access");
    Ok(DirectAccess {
        path: local,
        temp: Some(temp),
    })
}
