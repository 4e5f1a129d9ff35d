//! Span-prefixed chunk body
//!
//! Every chunk carries an 8-byte little-endian span followed by up to 4096
//! bytes of payload. The BMT hash of the body is the content address of a
//! content-addressed chunk and the signed digest of a single-owner chunk.

use bytes::{BufMut, Bytes, BytesMut};

use crate::SwarmAddress;
use crate::bmt::{Hasher, MAX_DATA_LENGTH, SPAN_SIZE};
use crate::cache::OnceCache;
use crate::chunk::error::{self, ChunkError};

/// The span and payload of a chunk, with its BMT hash computed on demand.
#[derive(Debug, Clone)]
pub struct BmtBody {
    span: u64,
    data: Bytes,
    hash: OnceCache<SwarmAddress>,
}

impl PartialEq for BmtBody {
    fn eq(&self, other: &Self) -> bool {
        self.span == other.span && self.data == other.data
    }
}

impl Eq for BmtBody {}

impl BmtBody {
    /// Body whose span is the payload length.
    pub fn from_payload(data: impl Into<Bytes>) -> error::Result<Self> {
        let data = validate_data(data)?;
        Ok(Self::new_unchecked(data.len() as u64, data))
    }

    /// Body with an explicit span.
    ///
    /// A span of at most 4096 describes a leaf and must equal the payload
    /// length; larger spans describe intermediate chunks whose payload is a
    /// list of child references.
    pub fn with_span(span: u64, data: impl Into<Bytes>) -> error::Result<Self> {
        let data = validate_data(data)?;
        if span <= MAX_DATA_LENGTH as u64 && data.len() as u64 != span {
            return Err(ChunkError::invalid_size(
                "span does not match data size",
                span as usize,
                data.len(),
            ));
        }
        Ok(Self::new_unchecked(span, data))
    }

    const fn new_unchecked(span: u64, data: Bytes) -> Self {
        Self { span, data, hash: OnceCache::new() }
    }

    /// Span of this body
    pub const fn span(&self) -> u64 {
        self.span
    }

    /// Payload of this body
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Serialized size: span plus payload
    pub fn size(&self) -> usize {
        SPAN_SIZE + self.data.len()
    }

    /// BMT hash of this body, computed once.
    pub fn hash(&self) -> SwarmAddress {
        *self.hash.get_or_compute(|| bmt_hash(self.span, &self.data))
    }

    /// Serialize as `span_le ++ payload`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        buf.put_u64_le(self.span);
        buf.put_slice(&self.data);
        buf.freeze()
    }
}

/// BMT hash of a span and payload.
pub(crate) fn bmt_hash(span: u64, data: &[u8]) -> SwarmAddress {
    let mut hasher = Hasher::new();
    hasher.set_span(span);
    hasher.update(data);
    hasher.sum().into()
}

/// Split `span_le ++ payload` into its parts without checking the span
/// against the payload length.
pub(crate) fn split_span(buf: &[u8]) -> error::Result<(u64, &[u8])> {
    let Some((span, payload)) = buf.split_first_chunk::<SPAN_SIZE>() else {
        return Err(ChunkError::invalid_size("insufficient data for span", SPAN_SIZE, buf.len()));
    };
    if payload.len() > MAX_DATA_LENGTH {
        return Err(ChunkError::invalid_size(
            "data exceeds maximum chunk size",
            MAX_DATA_LENGTH,
            payload.len(),
        ));
    }
    Ok((u64::from_le_bytes(*span), payload))
}

fn validate_data(data: impl Into<Bytes>) -> error::Result<Bytes> {
    let data = data.into();
    if data.len() > MAX_DATA_LENGTH {
        return Err(ChunkError::invalid_size(
            "data exceeds maximum chunk size",
            MAX_DATA_LENGTH,
            data.len(),
        ));
    }
    Ok(data)
}

impl From<BmtBody> for Bytes {
    fn from(body: BmtBody) -> Self {
        body.to_bytes()
    }
}

/// Parse `span_le ++ payload`.
///
/// The span is taken verbatim: encrypted chunks carry an encrypted span that
/// bears no relation to the payload length.
impl TryFrom<Bytes> for BmtBody {
    type Error = ChunkError;

    fn try_from(buf: Bytes) -> error::Result<Self> {
        let (span, payload) = split_span(&buf)?;
        let payload = buf.slice_ref(payload);
        Ok(Self::new_unchecked(span, payload))
    }
}

impl TryFrom<&[u8]> for BmtBody {
    type Error = ChunkError;

    fn try_from(buf: &[u8]) -> error::Result<Self> {
        Self::try_from(Bytes::copy_from_slice(buf))
    }
}

#[cfg(any(test, feature = "arbitrary"))]
impl<'a> arbitrary::Arbitrary<'a> for BmtBody {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let len: usize = u.int_in_range(0..=MAX_DATA_LENGTH)?;
        let mut data = vec![0; len];
        u.fill_buffer(&mut data)?;

        // leaf or intermediate span, both consistent with the payload
        let span = if u.arbitrary()? {
            len as u64
        } else {
            u.int_in_range(MAX_DATA_LENGTH as u64 + 1..=u64::MAX)?
        };
        Ok(Self::new_unchecked(span, data.into()))
    }
}
