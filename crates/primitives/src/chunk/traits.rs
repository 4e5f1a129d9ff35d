//! Traits shared by all chunk types

use crate::SwarmAddress;
use crate::chunk::error::{ChunkError, Result};
use bytes::Bytes;

/// Type alias for chunk addresses
pub type ChunkAddress = SwarmAddress;

/// Common interface of content-addressed and single-owner chunks.
pub trait Chunk: Send + Sync + 'static {
    /// Address of this chunk
    fn address(&self) -> &ChunkAddress;

    /// Payload of this chunk, without the span
    fn data(&self) -> &Bytes;

    /// Wire encoding of this chunk
    fn to_bytes(&self) -> Bytes;

    /// Size of the wire encoding in bytes
    fn size(&self) -> usize;

    /// Check this chunk against an expected address
    fn verify(&self, expected: &ChunkAddress) -> Result<()> {
        let actual = self.address();
        if actual != expected {
            return Err(ChunkError::invalid_address(*expected, *actual));
        }
        Ok(())
    }
}

/// Chunks whose body is hashed with the BMT
pub trait BmtChunk: Chunk {
    /// Span recorded in the chunk body
    fn span(&self) -> u64;
}
