//! Single-owner chunks
//!
//! A single-owner chunk (SOC) wraps a content-addressed chunk together with
//! an identifier and the owner's signature. Its address is
//! `keccak256(id ++ owner)`, so an owner can publish different content under
//! the same address over time. The owner is never stored: it is recovered
//! from the signature over `keccak256(id ++ wrapped_address)`.
//!
//! Wire layout: `id (32) ++ signature (65) ++ span (8) ++ payload`.

use alloy_primitives::{Address, B256, Keccak256, Signature};
use alloy_signer::SignerSync;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::PrimitivesError;
use crate::bmt::SPAN_SIZE;
use crate::cache::OnceCache;
use crate::chunk::error::{self, ChunkError};
use crate::error::Result;

use super::bmt_body::BmtBody;
use super::content::ContentChunk;
use super::traits::{BmtChunk, Chunk, ChunkAddress};

/// Size of the SOC identifier
pub const ID_SIZE: usize = std::mem::size_of::<B256>();
/// Size of an `r ++ s ++ v` signature
pub const SIGNATURE_SIZE: usize = 65;
const MIN_SOC_SIZE: usize = ID_SIZE + SIGNATURE_SIZE + SPAN_SIZE;

/// A chunk signed by a single owner.
#[derive(Debug, Clone)]
pub struct SingleOwnerChunk {
    id: B256,
    signature: Signature,
    body: BmtBody,
    address: OnceCache<ChunkAddress>,
    owner: OnceCache<Address>,
}

impl SingleOwnerChunk {
    /// Wrap `data` in a content chunk and sign it under `id`.
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn new(id: B256, data: impl Into<Bytes>, signer: &impl SignerSync) -> Result<Self> {
        Self::builder().with_data(data)?.with_id(id).with_signer(signer).map(|b| b.build())
    }

    /// Start building a chunk step by step.
    pub fn builder() -> SingleOwnerChunkBuilder {
        SingleOwnerChunkBuilder
    }

    /// Parse `bytes` and check that they belong under `address`.
    ///
    /// Fails with [`ChunkError::InvalidAddress`] when the recovered owner and
    /// id do not hash to `address`.
    pub fn from_chunk(address: &ChunkAddress, bytes: impl Into<Bytes>) -> Result<Self> {
        let soc = Self::try_from(bytes.into())?;
        let actual = soc.derive_address()?;
        if actual != *address {
            return Err(ChunkError::invalid_address(*address, actual).into());
        }
        soc.address.set(actual);
        Ok(soc)
    }

    /// Identifier chosen by the owner
    pub const fn id(&self) -> B256 {
        self.id
    }

    /// Owner's signature
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The wrapped content chunk.
    pub fn wrapped(&self) -> ContentChunk {
        ContentChunk::from_body(self.body.clone())
    }

    /// Owner address recovered from the signature.
    ///
    /// Only successful recoveries are cached.
    pub fn owner(&self) -> error::Result<Address> {
        if let Some(owner) = self.owner.get() {
            return Ok(*owner);
        }
        let digest = to_sign(&self.id, &self.body.hash());
        let owner = self.signature.recover_address_from_msg(digest)?;
        self.owner.set(owner);
        Ok(owner)
    }

    fn derive_address(&self) -> error::Result<ChunkAddress> {
        Ok(soc_address(&self.id, &self.owner()?))
    }
}

/// Digest the owner signs: `keccak256(id ++ wrapped_address)`.
fn to_sign(id: &B256, wrapped: &ChunkAddress) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(id);
    hasher.update(wrapped.as_bytes());
    hasher.finalize()
}

fn soc_address(id: &B256, owner: &Address) -> ChunkAddress {
    let mut hasher = Keccak256::new();
    hasher.update(id);
    hasher.update(owner);
    hasher.finalize().into()
}

impl Chunk for SingleOwnerChunk {
    fn address(&self) -> &ChunkAddress {
        // an unrecoverable signature yields an address no one can claim
        self.address.get_or_compute(|| soc_address(&self.id, &self.owner().unwrap_or(Address::ZERO)))
    }

    fn data(&self) -> &Bytes {
        self.body.data()
    }

    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        buf.put_slice(self.id.as_slice());
        buf.put_slice(&self.signature.as_bytes());
        buf.put_u64_le(self.body.span());
        buf.put_slice(self.body.data());
        buf.freeze()
    }

    fn size(&self) -> usize {
        ID_SIZE + SIGNATURE_SIZE + self.body.size()
    }

    fn verify(&self, expected: &ChunkAddress) -> error::Result<()> {
        let actual = self.derive_address()?;
        if actual != *expected {
            return Err(ChunkError::invalid_address(*expected, actual));
        }
        Ok(())
    }
}

impl BmtChunk for SingleOwnerChunk {
    fn span(&self) -> u64 {
        self.body.span()
    }
}

impl From<SingleOwnerChunk> for Bytes {
    fn from(chunk: SingleOwnerChunk) -> Self {
        chunk.to_bytes()
    }
}

impl TryFrom<Bytes> for SingleOwnerChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: Bytes) -> Result<Self> {
        if bytes.len() < MIN_SOC_SIZE {
            return Err(ChunkError::invalid_size(
                "insufficient data for single-owner chunk",
                MIN_SOC_SIZE,
                bytes.len(),
            )
            .into());
        }

        let id = B256::from_slice(&bytes[..ID_SIZE]);
        let signature = Signature::from_raw(&bytes[ID_SIZE..ID_SIZE + SIGNATURE_SIZE])
            .map_err(ChunkError::from)?;
        let body = BmtBody::try_from(bytes.slice(ID_SIZE + SIGNATURE_SIZE..))?;

        Ok(Self { id, signature, body, address: OnceCache::new(), owner: OnceCache::new() })
    }
}

impl TryFrom<&[u8]> for SingleOwnerChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::try_from(Bytes::copy_from_slice(bytes))
    }
}

impl fmt::Display for SingleOwnerChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner() {
            Ok(owner) => write!(f, "SingleOwnerChunk[id={}, owner={owner}]", ChunkAddress::from(self.id).short()),
            Err(_) => write!(f, "SingleOwnerChunk[id={}, owner=invalid]", ChunkAddress::from(self.id).short()),
        }
    }
}

impl PartialEq for SingleOwnerChunk {
    fn eq(&self, other: &Self) -> bool {
        match (self.owner(), other.owner()) {
            (Ok(a), Ok(b)) => self.id == other.id && a == b && self.body == other.body,
            _ => false,
        }
    }
}

impl Eq for SingleOwnerChunk {}

/// First step of [`SingleOwnerChunk::builder`]: choose the wrapped content.
#[derive(Debug, Default)]
pub struct SingleOwnerChunkBuilder;

impl SingleOwnerChunkBuilder {
    /// Wrap an existing content chunk.
    pub fn with_chunk(self, chunk: &ContentChunk) -> SingleOwnerChunkBuilderWithData {
        SingleOwnerChunkBuilderWithData { body: chunk.body().clone() }
    }

    /// Wrap a payload of at most 4096 bytes.
    pub fn with_data(self, data: impl Into<Bytes>) -> Result<SingleOwnerChunkBuilderWithData> {
        Ok(SingleOwnerChunkBuilderWithData { body: BmtBody::from_payload(data)? })
    }
}

/// Builder holding the wrapped content.
#[derive(Debug)]
pub struct SingleOwnerChunkBuilderWithData {
    body: BmtBody,
}

impl SingleOwnerChunkBuilderWithData {
    /// Set the identifier.
    pub fn with_id(self, id: B256) -> SingleOwnerChunkBuilderWithId {
        SingleOwnerChunkBuilderWithId { body: self.body, id }
    }
}

/// Builder holding the wrapped content and the identifier.
#[derive(Debug)]
pub struct SingleOwnerChunkBuilderWithId {
    body: BmtBody,
    id: B256,
}

impl SingleOwnerChunkBuilderWithId {
    /// Sign `keccak256(id ++ wrapped_address)` as an EIP-191 personal message.
    pub fn with_signer(self, signer: &impl SignerSync) -> Result<SingleOwnerChunkBuilderReady> {
        let digest = to_sign(&self.id, &self.body.hash());
        let signature = signer.sign_message_sync(digest.as_slice()).map_err(ChunkError::from)?;
        Ok(self.with_signature(signature))
    }

    /// Use a signature produced elsewhere.
    pub fn with_signature(self, signature: Signature) -> SingleOwnerChunkBuilderReady {
        SingleOwnerChunkBuilderReady { body: self.body, id: self.id, signature }
    }
}

/// Builder with every field set.
#[derive(Debug)]
pub struct SingleOwnerChunkBuilderReady {
    body: BmtBody,
    id: B256,
    signature: Signature,
}

impl SingleOwnerChunkBuilderReady {
    /// Assemble the chunk.
    pub fn build(self) -> SingleOwnerChunk {
        SingleOwnerChunk {
            id: self.id,
            signature: self.signature,
            body: self.body,
            address: OnceCache::new(),
            owner: OnceCache::new(),
        }
    }
}

#[cfg(test)]
impl<'a> arbitrary::Arbitrary<'a> for SingleOwnerChunk {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let id = B256::new(u.arbitrary()?);
        let len: usize = u.int_in_range(1..=crate::MAX_CHUNK_SIZE)?;
        let mut data = vec![0; len];
        u.fill_buffer(&mut data)?;
        let signer = alloy_signer_local::PrivateKeySigner::random();
        Self::new(id, data, &signer).map_err(|_| arbitrary::Error::IncorrectFormat)
    }
}
