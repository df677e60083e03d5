//! Re-openable byte content.
//!
//! [`ContentPayload`] is the boundary type for binary content entering or
//! leaving the core. It can be opened for reading any number of times and
//! never exposes a backend-native stream type to callers.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, StorageError};

/// Reader handed out by [`ContentPayload::reader`].
pub type PayloadReader = Box<dyn AsyncRead + Send + Unpin>;

/// A byte source that can be opened any number of times.
///
/// Implement this for lazily-opened content (remote objects, generated
/// streams). Each `open` call must yield a fresh reader positioned at the
/// start of the same content.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    async fn open(&self) -> Result<PayloadReader>;

    /// Size in bytes when cheaply known.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

#[derive(Clone)]
pub enum ContentPayload {
    /// Bytes held in memory.
    Memory(Bytes),
    /// A file on the local filesystem.
    File(PathBuf),
    /// A lazily-opened source.
    Source(Arc<dyn PayloadSource>),
}

impl ContentPayload {
    /// Open a fresh reader over the content.
    pub async fn reader(&self) -> Result<PayloadReader> {
        match self {
            Self::Memory(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            Self::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    StorageError::from_io(format!("opening payload file {}", path.display()), e)
                })?;
                Ok(Box::new(file))
            }
            Self::Source(source) => source.open().await,
        }
    }

    /// Size in bytes when cheaply known.
    pub async fn size(&self) -> Result<Option<u64>> {
        match self {
            Self::Memory(bytes) => Ok(Some(bytes.len() as u64)),
            Self::File(path) => {
                let meta = tokio::fs::metadata(path).await.map_err(|e| {
                    StorageError::from_io(format!("reading metadata of {}", path.display()), e)
                })?;
                Ok(Some(meta.len()))
            }
            Self::Source(source) => Ok(source.size_hint()),
        }
    }

    /// Drain the content into memory. Meant for small payloads and tests.
    pub async fn read_to_bytes(&self) -> Result<Bytes> {
        let mut reader = self.reader().await?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|e| StorageError::generic("reading payload", e))?;
        Ok(buf.into())
    }
}

impl fmt::Debug for ContentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => f.debug_tuple("Memory").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Source(_) => f.write_str("Source(..)"),
        }
    }
}

impl From<Bytes> for ContentPayload {
    fn from(bytes: Bytes) -> Self {
        Self::Memory(bytes)
    }
}

impl From<Vec<u8>> for ContentPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Memory(bytes.into())
    }
}

impl From<&str> for ContentPayload {
    fn from(s: &str) -> Self {
        Self::Memory(Bytes::copy_from_slice(s.as_bytes()))
    }
}
