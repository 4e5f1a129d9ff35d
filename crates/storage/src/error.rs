//! Error types for chunk stores.

use nectar_primitives::{PrimitivesError, SwarmAddress};
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors returned by [`Getter`](crate::Getter), [`Putter`](crate::Putter)
/// and [`Has`](crate::Has) implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The chunk is neither stored locally nor retrievable.
    #[error("chunk not found: {0}")]
    NotFound(SwarmAddress),

    /// The chunk was not found and a recovery request has been sent out.
    ///
    /// The caller may retry later.
    #[error("chunk recovery initiated: {0}")]
    RecoveryInitiated(SwarmAddress),

    /// The chunk bytes do not match the address they were requested under.
    #[error("invalid chunk: {0}")]
    InvalidChunk(SwarmAddress),

    /// A postage stamp could not be issued or is malformed.
    #[error("stamp error: {0}")]
    Stamp(String),

    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Errors from chunk primitives
    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}

impl StorageError {
    /// Create a [`StorageError::Stamp`] error.
    pub fn stamp<S: Into<String>>(msg: S) -> Self {
        Self::Stamp(msg.into())
    }

    /// Wrap a backend failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(err.into())
    }

    /// Whether the error means the chunk is unavailable, either outright or
    /// pending recovery.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::RecoveryInitiated(_))
    }
}
