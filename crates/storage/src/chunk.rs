//! Chunks as seen by a store.

use bytes::Bytes;
use nectar_primitives::{
    Chunk, ContentChunk, SPAN_SIZE, SingleOwnerChunk, SwarmAddress,
};

/// A chunk in wire form: `span (8, LE) ++ payload` for content-addressed
/// chunks, `id ++ signature ++ span ++ payload` for single-owner chunks.
///
/// Stores do not interpret the data beyond validation; the address is
/// trusted as given until [`is_valid`](Self::is_valid) is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChunk {
    address: SwarmAddress,
    data: Bytes,
    stamp: Option<Bytes>,
}

impl StoredChunk {
    /// Create a chunk from its address and wire bytes.
    pub fn new(address: SwarmAddress, data: impl Into<Bytes>) -> Self {
        Self { address, data: data.into(), stamp: None }
    }

    /// Attach a postage stamp.
    #[must_use]
    pub fn with_stamp(mut self, stamp: impl Into<Bytes>) -> Self {
        self.stamp = Some(stamp.into());
        self
    }

    /// Address of the chunk
    pub const fn address(&self) -> &SwarmAddress {
        &self.address
    }

    /// Wire bytes of the chunk
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Postage stamp, if one is attached
    pub fn stamp(&self) -> Option<&Bytes> {
        self.stamp.as_ref()
    }

    /// Span of a content-addressed chunk, `None` when the data is too short.
    pub fn span(&self) -> Option<u64> {
        let span = self.data.get(..SPAN_SIZE)?;
        span.try_into().ok().map(u64::from_le_bytes)
    }

    /// Payload of a content-addressed chunk, the bytes after the span.
    pub fn payload(&self) -> &[u8] {
        self.data.get(SPAN_SIZE..).unwrap_or_default()
    }

    /// Whether the data hashes to the address as a content-addressed chunk.
    pub fn is_valid_content(&self) -> bool {
        ContentChunk::is_valid(&self.address, &self.data)
    }

    /// Whether the data is a single-owner chunk signed for the address.
    pub fn is_valid_single_owner(&self) -> bool {
        SingleOwnerChunk::from_chunk(&self.address, self.data.clone()).is_ok()
    }

    /// Whether the chunk is valid under either addressing scheme.
    pub fn is_valid(&self) -> bool {
        self.is_valid_content() || self.is_valid_single_owner()
    }
}

impl From<&ContentChunk> for StoredChunk {
    fn from(chunk: &ContentChunk) -> Self {
        Self::new(*chunk.address(), chunk.to_bytes())
    }
}

impl From<ContentChunk> for StoredChunk {
    fn from(chunk: ContentChunk) -> Self {
        Self::from(&chunk)
    }
}

impl From<&SingleOwnerChunk> for StoredChunk {
    fn from(chunk: &SingleOwnerChunk) -> Self {
        Self::new(*chunk.address(), chunk.to_bytes())
    }
}

/// Overlay addresses of peers asked to re-upload a missing chunk.
///
/// Carried with a request as a hint for recovery; opaque to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets(Vec<Bytes>);

impl Targets {
    /// Wrap a list of target prefixes.
    pub const fn new(targets: Vec<Bytes>) -> Self {
        Self(targets)
    }

    /// Whether no target is given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the targets.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.0.iter()
    }
}

impl FromIterator<Bytes> for Targets {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
