//! Backend adapters and their construction from configuration.

pub mod fs;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use stratafs_common::backend::StorageBackend;
use stratafs_common::error::{Result, StorageError};

/// Declarative description of a storage backend, typically loaded from a
/// TOML document:
///
/// ```toml
/// kind = "fs"
/// root = "/var/lib/stratafs"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Local filesystem store rooted at `root`.
    Fs { root: PathBuf },
}

impl BackendConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| StorageError::RequestInvalid(format!("invalid backend config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StorageError::from_io(format!("reading {}", path.display()), e))?;
        Self::from_toml(&raw)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Fs { root } => {
                if root.as_os_str().is_empty() {
                    return Err(StorageError::RequestInvalid(
                        "backend root must not be empty".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Construct a backend from its configuration.
pub fn open_backend(config: &BackendConfig) -> Result<Box<dyn StorageBackend>> {
    match config {
        BackendConfig::Fs { root } => Ok(Box::new(fs::FsBackend::open(root)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let config = BackendConfig::from_toml(
            r#"
kind = "fs"
root = "/var/lib/stratafs"
"#,
        )
        .unwrap();
        let BackendConfig::Fs { root } = &config;
        assert_eq!(root, &PathBuf::from("/var/lib/stratafs"));
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            BackendConfig::from_toml("kind = \"warp-drive\""),
            Err(StorageError::RequestInvalid(_))
        ));
        assert!(matches!(
            BackendConfig::from_toml("kind = \"fs\"\nroot = \"\""),
            Err(StorageError::RequestInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_open_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackendConfig::Fs {
            root: dir.path().to_path_buf(),
        };
        let backend = open_backend(&config).unwrap();
        let container = stratafs_common::path::StoragePath::parse("archive1").unwrap();
        backend.create_container(&container).await.unwrap();
        backend.get_container(&container).await.unwrap();
    }
}
