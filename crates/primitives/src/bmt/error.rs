use thiserror::Error;

/// Result type for BMT operations
pub type Result<T> = std::result::Result<T, BmtError>;

/// Errors specific to BMT operations
#[derive(Error, Debug)]
pub enum BmtError {
    /// Input size is invalid for the operation
    #[error("Invalid input size: {0}")]
    InvalidInputSize(String),

    /// The hasher accepted fewer bytes than it was offered
    #[error("Short write to hasher: wrote {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes accepted by the hasher.
        written: usize,
        /// Bytes offered to the hasher.
        expected: usize,
    },
}

impl BmtError {
    /// Create an [`BmtError::InvalidInputSize`] error.
    pub fn invalid_input_size<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInputSize(msg.into())
    }

    /// Create a [`BmtError::ShortWrite`] error.
    pub const fn short_write(written: usize, expected: usize) -> Self {
        Self::ShortWrite { written, expected }
    }
}
