//! References to chunk trees.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, hex};
use bytes::{BufMut, Bytes, BytesMut};
use nectar_primitives::{HASH_SIZE, MAX_CHUNK_SIZE, SwarmAddress};

use crate::{FileError, Result};

/// Length of a chunk encryption key
pub const KEY_LENGTH: usize = 32;

/// Length of a plain reference, the chunk address alone
pub const REFERENCE_SIZE: usize = HASH_SIZE;

/// Length of an encrypted reference, chunk address followed by its key
pub const ENCRYPTED_REFERENCE_SIZE: usize = HASH_SIZE + KEY_LENGTH;

/// Symmetric key of a single encrypted chunk
pub type EncryptionKey = B256;

/// Address of a chunk, together with its decryption key when the chunk is
/// encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    address: SwarmAddress,
    key: Option<EncryptionKey>,
}

impl Reference {
    /// A plain reference
    pub const fn new(address: SwarmAddress) -> Self {
        Self { address, key: None }
    }

    /// A reference to an encrypted chunk
    pub const fn encrypted(address: SwarmAddress, key: EncryptionKey) -> Self {
        Self { address, key: Some(key) }
    }

    /// Parse a reference from its serialized form.
    ///
    /// 32 bytes are read as a plain reference and 64 bytes as address plus
    /// key; any other length is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            REFERENCE_SIZE => Ok(Self::new(SwarmAddress::from(B256::from_slice(bytes)))),
            ENCRYPTED_REFERENCE_SIZE => Ok(Self::encrypted(
                SwarmAddress::from(B256::from_slice(&bytes[..HASH_SIZE])),
                B256::from_slice(&bytes[HASH_SIZE..]),
            )),
            len => Err(FileError::InvalidReference(len)),
        }
    }

    /// Address of the referenced chunk
    pub const fn address(&self) -> &SwarmAddress {
        &self.address
    }

    /// Decryption key of the referenced chunk
    pub const fn key(&self) -> Option<&EncryptionKey> {
        self.key.as_ref()
    }

    /// Whether the referenced chunk is encrypted
    pub const fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    /// Serialized length
    pub const fn len(&self) -> usize {
        if self.is_encrypted() { ENCRYPTED_REFERENCE_SIZE } else { REFERENCE_SIZE }
    }

    /// Append the serialized reference to `buf`.
    pub fn put_into(&self, buf: &mut impl BufMut) {
        buf.put_slice(self.address.as_bytes());
        if let Some(key) = &self.key {
            buf.put_slice(key.as_slice());
        }
    }

    /// Serialize the reference.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());
        self.put_into(&mut buf);
        buf.freeze()
    }
}

impl From<SwarmAddress> for Reference {
    fn from(address: SwarmAddress) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for Reference {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| FileError::InvalidReference(s.len() / 2))?;
        Self::from_slice(&bytes)
    }
}

/// A reference together with the number of content bytes beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpannedReference {
    /// The chunk reference
    pub reference: Reference,
    /// Content bytes covered by the chunk
    pub span: u64,
}

impl SpannedReference {
    /// Pair a reference with its span.
    pub const fn new(reference: Reference, span: u64) -> Self {
        Self { reference, span }
    }

    /// Whether the chunk is a leaf holding content directly.
    pub const fn is_leaf(&self) -> bool {
        self.span <= MAX_CHUNK_SIZE as u64
    }
}
