//! Error taxonomy of the storage core.
//!
//! Backends map their native failures onto exactly these kinds at the
//! capability boundary. The engines layered above never invent new kinds,
//! so callers can distinguish "nothing there" from "not allowed" from
//! "malformed request" without inspecting backend internals.

use std::io;

/// Result alias used throughout the storage crates.
pub type Result<T, E = StorageError> = std::result::Result<T, E>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing resolves to the requested entity at the path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Creation was attempted where an entity already lives.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The backend refused the operation on permission grounds.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The request is malformed, e.g. a path whose shape does not match
    /// the requested operation.
    #[error("invalid request: {0}")]
    RequestInvalid(String),

    /// Any other backend failure, always carrying the native cause.
    #[error("{context}")]
    Generic {
        context: String,
        #[source]
        source: BoxedCause,
    },
}

impl StorageError {
    /// Wrap a backend-native failure that fits no other kind.
    pub fn generic(context: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::Generic {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Normalize an I/O failure for filesystem-like backends.
    pub fn from_io(context: impl Into<String>, err: io::Error) -> Self {
        let context = context.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(context),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(context),
            io::ErrorKind::PermissionDenied => Self::AuthorizationDenied(context),
            _ => Self::generic(context, err),
        }
    }
}
