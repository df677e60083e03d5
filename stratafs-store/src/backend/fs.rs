//! Local filesystem backend.
//!
//! Stores entities under `<root>/data/...`, one filesystem directory or
//! file per path segment chain, and binary version history under
//! `<root>/history/...`. Content writes go through a temp file → fsync →
//! rename step to prevent partial writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs::ReadDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use stratafs_common::backend::{BoxedResourceCursor, ResourceCursor, StorageBackend};
use stratafs_common::entity::{Binary, BinaryVersion, Container, Directory, EntityKind, Resource};
use stratafs_common::error::{Result, StorageError};
use stratafs_common::path::StoragePath;
use stratafs_common::payload::ContentPayload;

const WRITE_BUF_SIZE: usize = 64 * 1024;

/// Storage backend rooted at a local directory.
pub struct FsBackend {
    data_root: PathBuf,
    history_root: PathBuf,
    instance_id: String,
}

impl FsBackend {
    /// Open (or initialize) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_root = root.join("data");
        let history_root = root.join("history");
        for dir in [&data_root, &history_root] {
            std::fs::create_dir_all(dir)
                .map_err(|e| StorageError::from_io(format!("initializing {}", dir.display()), e))?;
        }
        // The canonical root identifies the physical store: two handles
        // over the same directory must report the same instance id.
        let canonical = root
            .canonicalize()
            .map_err(|e| StorageError::from_io(format!("resolving {}", root.display()), e))?;
        Ok(Self {
            data_root,
            history_root,
            instance_id: format!("fs:{}", canonical.display()),
        })
    }

    /// Absolute filesystem location of an entity inside this store.
    pub fn local_path(&self, path: &StoragePath) -> PathBuf {
        Self::resolve(&self.data_root, path)
    }

    fn resolve(root: &Path, path: &StoragePath) -> PathBuf {
        let mut full = root.to_path_buf();
        for segment in path.segments() {
            full.push(segment);
        }
        full
    }

    fn history_dir(&self, path: &StoragePath) -> PathBuf {
        Self::resolve(&self.history_root, path)
    }

    async fn metadata(&self, path: &StoragePath) -> Result<std::fs::Metadata> {
        tokio::fs::metadata(self.local_path(path))
            .await
            .map_err(|e| StorageError::from_io(format!("entity \"{path}\""), e))
    }

    /// Write payload content to `dest` atomically, returning the byte count
    /// and hex SHA-256 of what was written.
    async fn write_content(
        &self,
        dest: &Path,
        payload: &ContentPayload,
        context: &StoragePath,
    ) -> Result<(u64, String)> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(format!("creating parents of \"{context}\""), e))?;
        }

        let tmp = dest.with_extension("tmp");
        let mut reader = payload.reader().await?;
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| StorageError::from_io(format!("staging content of \"{context}\""), e))?;

        let mut hasher = Sha256::new();
        let mut size: u64 = 0;
        let mut buf = vec![0u8; WRITE_BUF_SIZE];
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::generic(format!("reading payload for \"{context}\""), e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n])
                .await
                .map_err(|e| StorageError::from_io(format!("writing content of \"{context}\""), e))?;
            size += n as u64;
        }
        file.sync_all()
            .await
            .map_err(|e| StorageError::from_io(format!("syncing content of \"{context}\""), e))?;
        drop(file);

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|e| StorageError::from_io(format!("committing content of \"{context}\""), e))?;

        Ok((size, hex::encode(hasher.finalize())))
    }

    fn binary_at(&self, path: &StoragePath, size: u64, sha256: Option<String>) -> Binary {
        Binary {
            path: path.clone(),
            size,
            sha256,
            content: ContentPayload::File(self.local_path(path)),
        }
    }

    async fn read_version_record(
        &self,
        path: &StoragePath,
        version_id: &str,
    ) -> Result<VersionRecord> {
        let sidecar = self.history_dir(path).join(format!("{version_id}.json"));
        let raw = tokio::fs::read(&sidecar).await.map_err(|e| {
            StorageError::from_io(format!("no version \"{version_id}\" of \"{path}\""), e)
        })?;
        serde_json::from_slice(&raw).map_err(|e| {
            StorageError::generic(format!("corrupt version record \"{version_id}\" of \"{path}\""), e)
        })
    }

    fn version_from_record(&self, path: &StoragePath, record: VersionRecord) -> BinaryVersion {
        let content = self.history_dir(path).join(&record.id);
        BinaryVersion {
            binary: Binary {
                path: path.clone(),
                size: record.size,
                sha256: Some(record.sha256),
                content: ContentPayload::File(content),
            },
            id: record.id,
            created: record.created,
            properties: record.properties,
        }
    }
}

fn check_version_id(version_id: &str) -> Result<()> {
    if version_id.is_empty() || version_id == ".." || version_id.contains(['/', '\\']) {
        return Err(StorageError::RequestInvalid(format!(
            "malformed version identifier {version_id:?}"
        )));
    }
    Ok(())
}

/// Version metadata sidecar, stored next to the snapshotted content.
#[derive(Debug, Serialize, Deserialize)]
struct VersionRecord {
    id: String,
    created: DateTime<Utc>,
    size: u64,
    sha256: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

#[async_trait]
impl StorageBackend for FsBackend {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn list_containers(&self) -> Result<BoxedResourceCursor> {
        let entries = tokio::fs::read_dir(&self.data_root)
            .await
            .map_err(|e| StorageError::from_io("listing containers", e))?;
        Ok(Box::new(DirCursor {
            parent: None,
            entries,
        }))
    }

    async fn create_container(&self, path: &StoragePath) -> Result<Container> {
        if !path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is not a container path"
            )));
        }
        tokio::fs::create_dir(self.local_path(path))
            .await
            .map_err(|e| StorageError::from_io(format!("creating container \"{path}\""), e))?;
        debug!(container = %path, "container created");
        Ok(Container { path: path.clone() })
    }

    async fn get_container(&self, path: &StoragePath) -> Result<Container> {
        if !path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is not a container path"
            )));
        }
        let meta = self.metadata(path).await?;
        if !meta.is_dir() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" does not hold a container"
            )));
        }
        Ok(Container { path: path.clone() })
    }

    async fn delete_container(&self, path: &StoragePath) -> Result<()> {
        if !path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is not a container path"
            )));
        }
        tokio::fs::remove_dir_all(self.local_path(path))
            .await
            .map_err(|e| StorageError::from_io(format!("deleting container \"{path}\""), e))?;
        // Version history of every binary under the container goes with it.
        if let Err(e) = tokio::fs::remove_dir_all(self.history_dir(path)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(StorageError::from_io(
                    format!("deleting history of \"{path}\""),
                    e,
                ));
            }
        }
        debug!(container = %path, "container deleted");
        Ok(())
    }

    async fn create_directory(&self, path: &StoragePath) -> Result<Directory> {
        if path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is a container path, not a directory path"
            )));
        }
        let full = self.local_path(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(format!("creating parents of \"{path}\""), e))?;
        }
        tokio::fs::create_dir(&full)
            .await
            .map_err(|e| StorageError::from_io(format!("creating directory \"{path}\""), e))?;
        Ok(Directory { path: path.clone() })
    }

    async fn get_directory(&self, path: &StoragePath) -> Result<Directory> {
        if path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is a container path, not a directory path"
            )));
        }
        let meta = self.metadata(path).await?;
        if !meta.is_dir() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" holds a binary, not a directory"
            )));
        }
        Ok(Directory { path: path.clone() })
    }

    async fn list_resources(&self, path: &StoragePath) -> Result<BoxedResourceCursor> {
        let meta = self.metadata(path).await?;
        if !meta.is_dir() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" holds a binary and cannot be listed"
            )));
        }
        let entries = tokio::fs::read_dir(self.local_path(path))
            .await
            .map_err(|e| StorageError::from_io(format!("listing \"{path}\""), e))?;
        Ok(Box::new(DirCursor {
            parent: Some(path.clone()),
            entries,
        }))
    }

    async fn count_resources(&self, path: &StoragePath) -> Result<u64> {
        let mut cursor = self.list_resources(path).await?;
        let mut count = 0;
        while cursor.next().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    async fn create_binary(&self, path: &StoragePath, payload: &ContentPayload) -> Result<Binary> {
        if path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is a container path, not a binary path"
            )));
        }
        let container = StoragePath::new([path.container_name()])?;
        self.get_container(&container).await?;

        let dest = self.local_path(path);
        if tokio::fs::try_exists(&dest)
            .await
            .map_err(|e| StorageError::from_io(format!("probing \"{path}\""), e))?
        {
            return Err(StorageError::AlreadyExists(format!(
                "an entity already lives at \"{path}\""
            )));
        }
        let (size, sha256) = self.write_content(&dest, payload, path).await?;
        debug!(binary = %path, size, "binary created");
        Ok(self.binary_at(path, size, Some(sha256)))
    }

    async fn get_binary(&self, path: &StoragePath) -> Result<Binary> {
        if path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is a container path, not a binary path"
            )));
        }
        let meta = self.metadata(path).await?;
        if meta.is_dir() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" holds a directory, not a binary"
            )));
        }
        Ok(self.binary_at(path, meta.len(), None))
    }

    async fn update_binary(
        &self,
        path: &StoragePath,
        payload: &ContentPayload,
        create_if_missing: bool,
    ) -> Result<Binary> {
        match self.get_binary(path).await {
            Ok(_) => {
                let dest = self.local_path(path);
                let (size, sha256) = self.write_content(&dest, payload, path).await?;
                debug!(binary = %path, size, "binary content updated");
                Ok(self.binary_at(path, size, Some(sha256)))
            }
            Err(StorageError::NotFound(_)) if create_if_missing => {
                self.create_binary(path, payload).await
            }
            Err(err) => Err(err),
        }
    }

    async fn delete_resource(&self, path: &StoragePath) -> Result<()> {
        if path.is_container() {
            return Err(StorageError::RequestInvalid(format!(
                "\"{path}\" is a container path; delete it as a container"
            )));
        }
        let meta = self.metadata(path).await?;
        let full = self.local_path(path);
        if meta.is_dir() {
            tokio::fs::remove_dir_all(&full)
                .await
                .map_err(|e| StorageError::from_io(format!("deleting \"{path}\""), e))?;
        } else {
            tokio::fs::remove_file(&full)
                .await
                .map_err(|e| StorageError::from_io(format!("deleting \"{path}\""), e))?;
        }
        if let Err(e) = tokio::fs::remove_dir_all(self.history_dir(path)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(StorageError::from_io(
                    format!("deleting history of \"{path}\""),
                    e,
                ));
            }
        }
        debug!(resource = %path, "resource deleted");
        Ok(())
    }

    async fn entity_kind(&self, path: &StoragePath) -> Result<EntityKind> {
        let meta = self.metadata(path).await?;
        Ok(if path.is_container() {
            EntityKind::Container
        } else if meta.is_dir() {
            EntityKind::Directory
        } else {
            EntityKind::Binary
        })
    }

    async fn list_versions(&self, path: &StoragePath) -> Result<Vec<BinaryVersion>> {
        self.get_binary(path).await?;
        let hdir = self.history_dir(path);
        let mut entries = match tokio::fs::read_dir(&hdir).await {
            Ok(entries) => entries,
            // No snapshot was ever taken.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::from_io(
                    format!("listing versions of \"{path}\""),
                    e,
                ))
            }
        };

        let mut versions = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::from_io(format!("listing versions of \"{path}\""), e))?;
            let Some(entry) = entry else { break };
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(id) = name.strip_suffix(".json") else {
                continue;
            };
            let record = self.read_version_record(path, id).await?;
            versions.push(self.version_from_record(path, record));
        }
        versions.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        Ok(versions)
    }

    async fn get_version(&self, path: &StoragePath, version_id: &str) -> Result<BinaryVersion> {
        check_version_id(version_id)?;
        let record = self.read_version_record(path, version_id).await?;
        Ok(self.version_from_record(path, record))
    }

    async fn create_version(
        &self,
        path: &StoragePath,
        properties: BTreeMap<String, String>,
    ) -> Result<BinaryVersion> {
        let current = self.get_binary(path).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let hdir = self.history_dir(path);

        let snapshot = hdir.join(&id);
        let (size, sha256) = self
            .write_content(&snapshot, &current.content, path)
            .await?;
        let record = VersionRecord {
            id: id.clone(),
            created: Utc::now(),
            size,
            sha256,
            properties,
        };
        let raw = serde_json::to_vec(&record)
            .map_err(|e| StorageError::generic(format!("encoding version record of \"{path}\""), e))?;
        tokio::fs::write(hdir.join(format!("{id}.json")), raw)
            .await
            .map_err(|e| StorageError::from_io(format!("recording version of \"{path}\""), e))?;
        debug!(binary = %path, version = %id, size, "version created");
        Ok(self.version_from_record(path, record))
    }

    async fn revert_to_version(&self, path: &StoragePath, version_id: &str) -> Result<()> {
        check_version_id(version_id)?;
        self.get_binary(path).await?;
        let record = self.read_version_record(path, version_id).await?;
        let snapshot = ContentPayload::File(self.history_dir(path).join(&record.id));
        let dest = self.local_path(path);
        self.write_content(&dest, &snapshot, path).await?;
        debug!(binary = %path, version = %version_id, "binary reverted");
        Ok(())
    }

    async fn delete_version(&self, path: &StoragePath, version_id: &str) -> Result<()> {
        check_version_id(version_id)?;
        // The sidecar read doubles as the existence check.
        self.read_version_record(path, version_id).await?;
        let hdir = self.history_dir(path);
        tokio::fs::remove_file(hdir.join(format!("{version_id}.json")))
            .await
            .map_err(|e| {
                StorageError::from_io(format!("deleting version \"{version_id}\" of \"{path}\""), e)
            })?;
        if let Err(e) = tokio::fs::remove_file(hdir.join(version_id)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(StorageError::from_io(
                    format!("deleting version \"{version_id}\" of \"{path}\""),
                    e,
                ));
            }
            warn!(binary = %path, version = %version_id, "version record had no content file");
        }
        Ok(())
    }

    async fn try_native_move(&self, from: &StoragePath, to: &StoragePath) -> Result<bool> {
        self.metadata(from).await?;
        let source = self.local_path(from);
        let dest = self.local_path(to);
        if tokio::fs::try_exists(&dest)
            .await
            .map_err(|e| StorageError::from_io(format!("probing \"{to}\""), e))?
        {
            return Err(StorageError::AlreadyExists(format!(
                "an entity already lives at \"{to}\""
            )));
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(format!("creating parents of \"{to}\""), e))?;
        }
        tokio::fs::rename(&source, &dest)
            .await
            .map_err(|e| StorageError::from_io(format!("moving \"{from}\" to \"{to}\""), e))?;

        // Carry version history along with the subtree.
        let from_history = self.history_dir(from);
        if tokio::fs::try_exists(&from_history)
            .await
            .map_err(|e| StorageError::from_io(format!("probing history of \"{from}\""), e))?
        {
            let to_history = self.history_dir(to);
            if let Some(parent) = to_history.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StorageError::from_io(format!("creating history parents of \"{to}\""), e)
                })?;
            }
            tokio::fs::rename(&from_history, &to_history)
                .await
                .map_err(|e| StorageError::from_io(format!("moving history of \"{from}\""), e))?;
        }
        debug!(from = %from, to = %to, "native move");
        Ok(true)
    }
}

/// Cursor over one level of a data directory.
///
/// `parent == None` means the store root: entries are containers.
struct DirCursor {
    parent: Option<StoragePath>,
    entries: ReadDir,
}

#[async_trait]
impl ResourceCursor for DirCursor {
    async fn next(&mut self) -> Result<Option<Resource>> {
        loop {
            let entry = self
                .entries
                .next_entry()
                .await
                .map_err(|e| StorageError::from_io("reading directory entry", e))?;
            let Some(entry) = entry else { return Ok(None) };

            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::from_io(format!("inspecting entry {name:?}"), e))?;

            let resource = match &self.parent {
                None => {
                    // Stray files at the root are not containers.
                    if !file_type.is_dir() {
                        continue;
                    }
                    Resource::new(StoragePath::new([name])?, EntityKind::Container)
                }
                Some(parent) => {
                    let kind = if file_type.is_dir() {
                        EntityKind::Directory
                    } else {
                        EntityKind::Binary
                    };
                    Resource::new(parent.child(name)?, kind)
                }
            };
            return Ok(Some(resource));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> StoragePath {
        StoragePath::parse(raw).unwrap()
    }

    async fn backend() -> (tempfile::TempDir, FsBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn test_container_lifecycle() {
        let (_dir, backend) = backend().await;

        backend.create_container(&path("archive1")).await.unwrap();
        let container = backend.get_container(&path("archive1")).await.unwrap();
        assert_eq!(container.path, path("archive1"));

        assert!(matches!(
            backend.create_container(&path("archive1")).await,
            Err(StorageError::AlreadyExists(_))
        ));
        assert!(matches!(
            backend.get_container(&path("missing")).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            backend.create_container(&path("a/b")).await,
            Err(StorageError::RequestInvalid(_))
        ));

        backend.delete_container(&path("archive1")).await.unwrap();
        assert!(matches!(
            backend.get_container(&path("archive1")).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_containers_skips_stray_files() {
        let (dir, backend) = backend().await;
        backend.create_container(&path("a")).await.unwrap();
        backend.create_container(&path("b")).await.unwrap();
        std::fs::write(dir.path().join("data").join("stray"), b"x").unwrap();

        let mut cursor = backend.list_containers().await.unwrap();
        let mut names = Vec::new();
        while let Some(resource) = cursor.next().await.unwrap() {
            assert_eq!(resource.kind, EntityKind::Container);
            names.push(resource.path.to_string());
        }
        names.sort();
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_directory_shape_rules() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();

        // Requesting a directory at a container-only path is malformed.
        assert!(matches!(
            backend.get_directory(&path("archive1")).await,
            Err(StorageError::RequestInvalid(_))
        ));

        backend
            .create_directory(&path("archive1/unit-a"))
            .await
            .unwrap();
        backend
            .get_directory(&path("archive1/unit-a"))
            .await
            .unwrap();

        // Parents appear implicitly.
        backend
            .create_directory(&path("archive1/x/y/z"))
            .await
            .unwrap();
        backend.get_directory(&path("archive1/x/y")).await.unwrap();

        assert!(matches!(
            backend.get_directory(&path("archive1/missing")).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_binary_lifecycle() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();

        let binary = backend
            .create_binary(&path("archive1/unit-a/file.bin"), &"hello".into())
            .await
            .unwrap();
        assert_eq!(binary.size, 5);
        assert!(binary.sha256.is_some());

        let read_back = backend
            .get_binary(&path("archive1/unit-a/file.bin"))
            .await
            .unwrap();
        assert_eq!(
            &read_back.content.read_to_bytes().await.unwrap()[..],
            b"hello"
        );

        assert!(matches!(
            backend
                .create_binary(&path("archive1/unit-a/file.bin"), &"again".into())
                .await,
            Err(StorageError::AlreadyExists(_))
        ));
        // Binaries need their container to exist already.
        assert!(matches!(
            backend
                .create_binary(&path("nowhere/file.bin"), &"x".into())
                .await,
            Err(StorageError::NotFound(_))
        ));

        let updated = backend
            .update_binary(&path("archive1/unit-a/file.bin"), &"rewritten".into(), false)
            .await
            .unwrap();
        assert_eq!(updated.size, 9);

        assert!(matches!(
            backend
                .update_binary(&path("archive1/unit-a/other.bin"), &"x".into(), false)
                .await,
            Err(StorageError::NotFound(_))
        ));
        backend
            .update_binary(&path("archive1/unit-a/other.bin"), &"x".into(), true)
            .await
            .unwrap();

        // A directory path is not a binary.
        assert!(matches!(
            backend.get_binary(&path("archive1/unit-a")).await,
            Err(StorageError::RequestInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_resource() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();
        backend
            .create_binary(&path("archive1/unit-a/file.bin"), &"hello".into())
            .await
            .unwrap();

        assert!(matches!(
            backend.delete_resource(&path("archive1/missing")).await,
            Err(StorageError::NotFound(_))
        ));

        backend
            .delete_resource(&path("archive1/unit-a"))
            .await
            .unwrap();
        assert!(matches!(
            backend.entity_kind(&path("archive1/unit-a")).await,
            Err(StorageError::NotFound(_))
        ));
        backend.get_container(&path("archive1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_entity_kind() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();
        backend
            .create_binary(&path("archive1/unit-a/file.bin"), &"hello".into())
            .await
            .unwrap();

        assert_eq!(
            backend.entity_kind(&path("archive1")).await.unwrap(),
            EntityKind::Container
        );
        assert_eq!(
            backend.entity_kind(&path("archive1/unit-a")).await.unwrap(),
            EntityKind::Directory
        );
        assert_eq!(
            backend
                .entity_kind(&path("archive1/unit-a/file.bin"))
                .await
                .unwrap(),
            EntityKind::Binary
        );
        assert!(matches!(
            backend.entity_kind(&path("archive1/nope")).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_single_level_listing() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();
        backend
            .create_binary(&path("archive1/unit-a/file.bin"), &"hello".into())
            .await
            .unwrap();

        let mut cursor = backend.list_resources(&path("archive1/unit-a")).await.unwrap();
        let only = cursor.next().await.unwrap().unwrap();
        assert_eq!(only.path, path("archive1/unit-a/file.bin"));
        assert_eq!(only.kind, EntityKind::Binary);
        assert!(cursor.next().await.unwrap().is_none());

        assert_eq!(
            backend.count_resources(&path("archive1/unit-a")).await.unwrap(),
            1
        );
        assert!(matches!(
            backend
                .list_resources(&path("archive1/unit-a/file.bin"))
                .await,
            Err(StorageError::RequestInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_version_history() {
        let (_dir, backend) = backend().await;
        let file = path("archive1/file.bin");
        backend.create_container(&path("archive1")).await.unwrap();
        backend.create_binary(&file, &"v1".into()).await.unwrap();

        let mut props = BTreeMap::new();
        props.insert("reason".to_string(), "before ingest rewrite".to_string());
        let first = backend.create_version(&file, props.clone()).await.unwrap();
        assert_eq!(first.binary.size, 2);
        assert_eq!(first.properties, props);

        backend.update_binary(&file, &"v2 content".into(), false).await.unwrap();
        let second = backend
            .create_version(&file, BTreeMap::new())
            .await
            .unwrap();

        let versions = backend.list_versions(&file).await.unwrap();
        assert_eq!(versions.len(), 2);
        // Newest first.
        assert_eq!(versions[0].id, second.id);

        let fetched = backend.get_version(&file, &first.id).await.unwrap();
        assert_eq!(
            &fetched.binary.content.read_to_bytes().await.unwrap()[..],
            b"v1"
        );

        // Revert restores content without touching history.
        backend.revert_to_version(&file, &first.id).await.unwrap();
        let current = backend.get_binary(&file).await.unwrap();
        assert_eq!(&current.content.read_to_bytes().await.unwrap()[..], b"v1");
        assert_eq!(backend.list_versions(&file).await.unwrap().len(), 2);

        backend.delete_version(&file, &first.id).await.unwrap();
        assert_eq!(backend.list_versions(&file).await.unwrap().len(), 1);
        assert!(matches!(
            backend.get_version(&file, &first.id).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            backend.get_version(&file, "../escape").await,
            Err(StorageError::RequestInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_versions_of_missing_binary() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();
        assert!(matches!(
            backend.list_versions(&path("archive1/nope")).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_native_move() {
        let (_dir, backend) = backend().await;
        backend.create_container(&path("archive1")).await.unwrap();
        backend.create_container(&path("archive2")).await.unwrap();
        backend
            .create_binary(&path("archive1/a/file.bin"), &"hello".into())
            .await
            .unwrap();
        backend
            .create_version(&path("archive1/a/file.bin"), BTreeMap::new())
            .await
            .unwrap();

        let moved = backend
            .try_native_move(&path("archive1/a"), &path("archive2/b"))
            .await
            .unwrap();
        assert!(moved);

        assert!(matches!(
            backend.entity_kind(&path("archive1/a")).await,
            Err(StorageError::NotFound(_))
        ));
        let binary = backend.get_binary(&path("archive2/b/file.bin")).await.unwrap();
        assert_eq!(&binary.content.read_to_bytes().await.unwrap()[..], b"hello");
        // History moved with the subtree.
        assert_eq!(
            backend
                .list_versions(&path("archive2/b/file.bin"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_same_root_same_instance_id() {
        let dir = tempfile::tempdir().unwrap();
        let a = FsBackend::open(dir.path()).unwrap();
        let b = FsBackend::open(dir.path()).unwrap();
        assert_eq!(a.instance_id(), b.instance_id());

        let other = tempfile::tempdir().unwrap();
        let c = FsBackend::open(other.path()).unwrap();
        assert_ne!(a.instance_id(), c.instance_id());
    }
}
