//! Error types for file chunking and joining.

use nectar_primitives::{PrimitivesError, SwarmAddress, bmt::BmtError};
use nectar_storage::StorageError;
use thiserror::Error;

/// Result type for file operations
pub type Result<T> = std::result::Result<T, FileError>;

/// Errors raised while splitting content into chunks or joining it back.
#[derive(Error, Debug)]
pub enum FileError {
    /// A writer accepted fewer bytes than it was offered.
    #[error("short write: wrote {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes accepted.
        written: usize,
        /// Bytes offered.
        expected: usize,
    },

    /// The operation was cancelled through its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A chunk of the tree is unavailable.
    #[error("chunk not found: {0}")]
    NotFound(SwarmAddress),

    /// A chunk of the tree is unavailable and its recovery has been requested.
    #[error("chunk recovery initiated: {0}")]
    RecoveryInitiated(SwarmAddress),

    /// A chunk's bytes do not hash to the address it was fetched under.
    #[error("invalid chunk: {0}")]
    InvalidChunk(SwarmAddress),

    /// The chunk tree is structurally inconsistent.
    #[error("corrupt chunk tree: {0}")]
    CorruptTree(String),

    /// A reference has neither the plain nor the encrypted length.
    #[error("invalid reference length: {0}")]
    InvalidReference(usize),

    /// A read started past the end of the content.
    #[error("offset {offset} out of range for content of {size} bytes")]
    OutOfRange {
        /// Requested offset.
        offset: u64,
        /// Size of the content.
        size: u64,
    },

    /// Encrypted chunk data could not be decrypted.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Any other store failure
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),

    /// Errors from chunk primitives
    #[error(transparent)]
    Primitives(#[from] PrimitivesError),

    /// I/O errors while reading input or writing output
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FileError {
    /// Create a [`FileError::CorruptTree`] error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::CorruptTree(msg.into())
    }

    /// Create a [`FileError::Decryption`] error.
    pub fn decryption<S: Into<String>>(msg: S) -> Self {
        Self::Decryption(msg.into())
    }

    /// Whether the error means some chunk is unavailable.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::RecoveryInitiated(_))
    }
}

impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(address) => Self::NotFound(address),
            StorageError::RecoveryInitiated(address) => Self::RecoveryInitiated(address),
            StorageError::InvalidChunk(address) => Self::InvalidChunk(address),
            other => Self::Storage(other),
        }
    }
}

impl From<BmtError> for FileError {
    fn from(err: BmtError) -> Self {
        match err {
            BmtError::ShortWrite { written, expected } => Self::ShortWrite { written, expected },
            other => Self::Primitives(other.into()),
        }
    }
}
