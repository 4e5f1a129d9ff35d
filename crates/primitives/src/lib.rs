//! Core primitives for a decentralized storage system
//!
//! This crate provides the fundamental types and operations used to address
//! data in the swarm: the chunk model, the binary merkle tree hasher that
//! computes content addresses, and a pool of reusable hashers for
//! high-throughput chunking.
//!
//! ## Key Components
//!
//! - **Chunks**: Content-addressed and signed data chunks ([`ContentChunk`], [`SingleOwnerChunk`])
//! - **Binary Merkle Tree**: Content addressing over a span-prefixed payload ([`bmt::Hasher`])
//! - **Hasher pool**: Bounded reuse of hashers across uploads ([`bmt::HasherPool`])
//! - **SwarmAddress**: 256-bit identifiers for network addressing
//!
//! ## Usage Examples
//!
//! ```
//! use nectar_primitives::{Chunk, ContentChunk, SingleOwnerChunk, bmt::HasherPool};
//! use alloy_signer_local::LocalSigner;
//! use alloy_primitives::FixedBytes;
//!
//! // Creating content chunks
//! let chunk = ContentChunk::new(b"Hello, world!".as_slice()).unwrap();
//! assert!(ContentChunk::is_valid(chunk.address(), &chunk.to_bytes()));
//!
//! // Hashing with a pooled hasher
//! let pool = HasherPool::new(4);
//! let mut hasher = pool.acquire();
//! hasher.set_span(13);
//! hasher.update(b"Hello, world!");
//! assert_eq!(hasher.sum(), chunk.address().0);
//!
//! // Creating signed chunks
//! let wallet = LocalSigner::random();
//! let id = FixedBytes::random();
//! let owner_chunk = SingleOwnerChunk::new(id, b"Signed data".as_slice(), &wallet).unwrap();
//! ```

// Re-export dependencies that are part of our public API
pub use bytes;

pub mod address;
pub mod bmt;
mod cache;
pub mod chunk;
pub mod error;

// Re-export core constants
pub use bmt::{HASH_SIZE, MAX_DATA_LENGTH as MAX_CHUNK_SIZE, SPAN_SIZE};

// Re-export core types
pub use address::SwarmAddress;
pub use error::{PrimitivesError, Result};

// Core BMT functionality
pub use bmt::{Hasher, HasherPool, PooledHasher};

// Core chunk functionality
pub use chunk::{
    BmtChunk,
    // Core traits
    Chunk,
    ChunkAddress,
    ChunkError,

    // Concrete chunk types
    ContentChunk,
    SingleOwnerChunk,
};

// Builder types (facade for implementation)
pub use chunk::{
    SingleOwnerChunkBuilder, SingleOwnerChunkBuilderReady, SingleOwnerChunkBuilderWithData,
    SingleOwnerChunkBuilderWithId,
};
