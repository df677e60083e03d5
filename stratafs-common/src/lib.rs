//! Shared data model and backend contract for the stratafs storage core.
//!
//! This crate defines the pieces every backend and engine agrees on: the
//! [`path::StoragePath`] addressing model, the entity types, the
//! [`payload::ContentPayload`] content boundary, the
//! [`error::StorageError`] taxonomy, and the
//! [`backend::StorageBackend`] capability trait. Backend adapters and the
//! engines layered on top live in `stratafs-store`.

pub mod backend;
pub mod entity;
pub mod error;
pub mod path;
pub mod payload;

pub use backend::{BoxedResourceCursor, ResourceCursor, StorageBackend};
pub use entity::{Binary, BinaryVersion, Container, Directory, EntityKind, Resource};
pub use error::{Result, StorageError};
pub use path::StoragePath;
pub use payload::{ContentPayload, PayloadReader, PayloadSource};
