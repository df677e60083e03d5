//! Storage engines layered over the backend capability contract.
//!
//! `stratafs-common` defines the data model and the
//! [`StorageBackend`](stratafs_common::backend::StorageBackend) trait;
//! this crate supplies everything built on top of it:
//!
//! - the local filesystem reference backend ([`backend::fs`]) and its
//!   construction from configuration ([`backend::BackendConfig`]),
//! - backend-agnostic recursive traversal ([`walk`]),
//! - cross-backend copy and move ([`transfer`]),
//! - direct-access staging into temporary local paths ([`staging`]),
//! - collision-safe random-id creation ([`random`]),
//! - and [`ext::StorageBackendExt`], which surfaces all of the above as
//!   methods on any backend.

pub mod backend;
pub mod ext;
pub mod random;
pub mod staging;
pub mod transfer;
pub mod walk;

pub use backend::fs::FsBackend;
pub use backend::{open_backend, BackendConfig};
pub use ext::StorageBackendExt;
pub use staging::DirectAccess;
pub use transfer::TransferOptions;
pub use walk::RecursiveListing;
