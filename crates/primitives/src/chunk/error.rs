use crate::SwarmAddress;
use thiserror::Error;

/// Result type for chunk operations
pub(crate) type Result<T> = std::result::Result<T, ChunkError>;

/// Errors specific to chunk operations
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Chunk size is invalid
    #[error("Invalid chunk size: {message} (expected: {expected}, got: {actual})")]
    InvalidSize {
        /// What was being checked
        message: &'static str,
        /// Expected size, or the bound that was violated
        expected: usize,
        /// Observed size
        actual: usize,
    },

    /// Chunk format is invalid
    #[error("Invalid chunk format: {0}")]
    InvalidFormat(String),

    /// The address derived from the chunk does not match the claimed one
    #[error("Chunk address mismatch: expected {expected}, got {actual}")]
    InvalidAddress {
        /// Address the chunk was expected to have
        expected: SwarmAddress,
        /// Address derived from the chunk contents
        actual: SwarmAddress,
    },

    /// Signature errors from the crypto library
    #[error("Signature error: {0}")]
    Signature(#[from] alloy_primitives::SignatureError),

    /// Signer errors
    #[error("Signer error: {0}")]
    Signer(#[from] alloy_signer::Error),

    /// Chunk signature is invalid
    #[error("Invalid chunk signature: {0}")]
    InvalidSignature(String),
}

impl ChunkError {
    /// Create an [`ChunkError::InvalidSize`] error.
    pub const fn invalid_size(message: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidSize { message, expected, actual }
    }

    /// Create an [`ChunkError::InvalidFormat`] error.
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create an [`ChunkError::InvalidAddress`] error.
    pub const fn invalid_address(expected: SwarmAddress, actual: SwarmAddress) -> Self {
        Self::InvalidAddress { expected, actual }
    }

    /// Create an [`ChunkError::InvalidSignature`] error.
    pub fn invalid_signature<S: Into<String>>(msg: S) -> Self {
        Self::InvalidSignature(msg.into())
    }
}
