//! Chunk types
//!
//! Content-addressed chunks are named by the BMT hash of their body;
//! single-owner chunks wrap one under an owner-signed identifier.

mod bmt_body;
mod content;
pub(crate) mod error;
mod single_owner;
mod traits;

pub use bmt_body::BmtBody;
pub use error::ChunkError;
pub use traits::{BmtChunk, Chunk, ChunkAddress};

pub use content::ContentChunk;
pub use single_owner::{
    ID_SIZE, SIGNATURE_SIZE, SingleOwnerChunk, SingleOwnerChunkBuilder,
    SingleOwnerChunkBuilderReady, SingleOwnerChunkBuilderWithData, SingleOwnerChunkBuilderWithId,
};
