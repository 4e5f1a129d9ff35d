//! Error types for the network store and its collaborators.

use nectar_primitives::SwarmAddress;
use nectar_storage::StorageError;
use thiserror::Error;

/// Result type for collaborator calls
pub type Result<T> = std::result::Result<T, NetStoreError>;

/// Failures of the network retrieval collaborator.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// No peer could deliver the chunk.
    #[error("chunk not retrievable: {0}")]
    NotFound(SwarmAddress),

    /// The request could not be completed.
    #[error("retrieval failed: {0}")]
    Failed(String),
}

impl RetrievalError {
    /// Create a [`RetrievalError::Failed`] error.
    pub fn failed<S: Into<String>>(msg: S) -> Self {
        Self::Failed(msg.into())
    }
}

/// Failures of the recovery collaborator.
#[derive(Error, Debug)]
#[error("recovery failed: {0}")]
pub struct RecoveryError(String);

impl RecoveryError {
    /// Create a recovery error.
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

/// Errors from the collaborators of a [`NetStore`](crate::NetStore).
///
/// Chunk reads themselves report a [`StorageError`]; these errors only reach
/// callers of the collaborators directly and the logs.
#[derive(Error, Debug)]
pub enum NetStoreError {
    /// Network retrieval failed
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Recovery request failed
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    /// The chunk's postage stamp is not valid
    #[error("invalid stamp: {0}")]
    InvalidStamp(String),

    /// Local store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl NetStoreError {
    /// Create a [`NetStoreError::InvalidStamp`] error.
    pub fn invalid_stamp<S: Into<String>>(msg: S) -> Self {
        Self::InvalidStamp(msg.into())
    }
}
