//! Content-addressed chunks
//!
//! A content-addressed chunk (CAC) is named by the BMT hash of its body, so
//! anyone holding the bytes can check that they match the address.

use bytes::Bytes;
use std::fmt;

use crate::cache::OnceCache;
use crate::error::{PrimitivesError, Result};

use super::bmt_body::{BmtBody, bmt_hash, split_span};
use super::error::ChunkError;
use super::traits::{BmtChunk, Chunk, ChunkAddress};

/// A content-addressed chunk.
///
/// Immutable once created; the address is computed on first use.
#[derive(Debug, Clone)]
pub struct ContentChunk {
    body: BmtBody,
    address: OnceCache<ChunkAddress>,
}

impl ContentChunk {
    /// Create a leaf chunk from a payload of 1 to 4096 bytes.
    ///
    /// The span is the payload length.
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(ChunkError::invalid_size("empty payload", 1, 0).into());
        }
        Ok(Self::from_body(BmtBody::from_payload(data)?))
    }

    /// Create a chunk with an explicit span, as used for intermediate chunks
    /// of a hash trie.
    pub fn with_span(span: u64, data: impl Into<Bytes>) -> Result<Self> {
        Ok(Self::from_body(BmtBody::with_span(span, data)?))
    }

    /// Create a chunk whose address is already known, e.g. when reloading
    /// from a store that verified it on entry.
    pub fn with_address(data: impl Into<Bytes>, address: ChunkAddress) -> Result<Self> {
        let data = data.into();
        let body = BmtBody::try_from(data)?;
        Ok(Self { body, address: OnceCache::with_value(address) })
    }

    /// Wrap an existing body.
    #[must_use]
    pub fn from_body(body: BmtBody) -> Self {
        Self { body, address: OnceCache::new() }
    }

    /// Check whether `data` (`span_le ++ payload`) hashes to `address`.
    ///
    /// Malformed data is never valid.
    pub fn is_valid(address: &ChunkAddress, data: &[u8]) -> bool {
        match split_span(data) {
            Ok((span, payload)) => bmt_hash(span, payload) == *address,
            Err(_) => false,
        }
    }

    /// The chunk body
    pub const fn body(&self) -> &BmtBody {
        &self.body
    }
}

impl Chunk for ContentChunk {
    fn address(&self) -> &ChunkAddress {
        self.address.get_or_compute(|| self.body.hash())
    }

    fn data(&self) -> &Bytes {
        self.body.data()
    }

    fn to_bytes(&self) -> Bytes {
        self.body.to_bytes()
    }

    fn size(&self) -> usize {
        self.body.size()
    }
}

impl BmtChunk for ContentChunk {
    fn span(&self) -> u64 {
        self.body.span()
    }
}

impl From<ContentChunk> for Bytes {
    fn from(chunk: ContentChunk) -> Self {
        chunk.body.into()
    }
}

impl TryFrom<Bytes> for ContentChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: Bytes) -> Result<Self> {
        Ok(Self::from_body(BmtBody::try_from(bytes)?))
    }
}

impl TryFrom<&[u8]> for ContentChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::try_from(Bytes::copy_from_slice(bytes))
    }
}

impl fmt::Display for ContentChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentChunk[{}]", self.address().short())
    }
}

impl PartialEq for ContentChunk {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for ContentChunk {}

#[cfg(any(test, feature = "arbitrary"))]
impl<'a> arbitrary::Arbitrary<'a> for ContentChunk {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from_body(BmtBody::arbitrary(u)?))
    }
}
