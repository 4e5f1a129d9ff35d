//! Keccak counter-mode chunk encryption.
//!
//! Each 32-byte segment `i` of the input is XORed with
//! `keccak(keccak(key ++ le32(init_ctr + i)))`. The span and the payload of a
//! chunk are encrypted with separate counter offsets so the two ciphertexts
//! do not share keystream.

use alloy_primitives::{B256, keccak256};
use bytes::{BufMut, Bytes, BytesMut};
use nectar_primitives::{MAX_CHUNK_SIZE, SPAN_SIZE};
use rayon::prelude::*;

use crate::reference::{ENCRYPTED_REFERENCE_SIZE, EncryptionKey, KEY_LENGTH};
use crate::{FileError, Result};

const SEGMENT_SIZE: usize = 32;

/// Counter offset of the span cipher, past every payload segment.
const SPAN_INIT_CTR: u32 = (MAX_CHUNK_SIZE / ENCRYPTED_REFERENCE_SIZE) as u32;

/// A keyed keccak counter-mode cipher.
#[derive(Debug, Clone)]
pub struct Encryption {
    key: EncryptionKey,
    padding: usize,
    init_ctr: u32,
}

impl Encryption {
    /// Cipher over `key`, padding plaintexts to `padding` bytes (0 for none)
    /// and numbering segments from `init_ctr`.
    pub const fn new(key: EncryptionKey, padding: usize, init_ctr: u32) -> Self {
        Self { key, padding, init_ctr }
    }

    /// Cipher for the 8-byte span of a chunk
    pub const fn span(key: EncryptionKey) -> Self {
        Self::new(key, 0, SPAN_INIT_CTR)
    }

    /// Cipher for the payload of a chunk, padded to a full chunk
    pub const fn data(key: EncryptionKey) -> Self {
        Self::new(key, MAX_CHUNK_SIZE, 0)
    }

    /// The key
    pub const fn key(&self) -> &EncryptionKey {
        &self.key
    }

    /// Encrypt `data`.
    ///
    /// With padding set, the plaintext is extended with random bytes up to
    /// the padding length; the padding is not XORed.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let length = self.padded_len(data.len())?;
        let mut out = vec![0u8; length];
        if length > data.len() {
            rand::fill(&mut out[data.len()..]);
        }
        self.transcrypt(data, &mut out[..data.len()]);
        Ok(out)
    }

    /// Decrypt `data`, which must be exactly the padding length when padding
    /// is set.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.padding > 0 && data.len() != self.padding {
            return Err(FileError::decryption(format!(
                "ciphertext is {} bytes, expected {}",
                data.len(),
                self.padding
            )));
        }
        let mut out = vec![0u8; data.len()];
        self.transcrypt(data, &mut out);
        Ok(out)
    }

    fn padded_len(&self, len: usize) -> Result<usize> {
        match self.padding {
            0 => Ok(len),
            padding if len <= padding => Ok(padding),
            padding => Err(FileError::decryption(format!(
                "plaintext is {len} bytes, longer than padding {padding}"
            ))),
        }
    }

    fn transcrypt(&self, input: &[u8], out: &mut [u8]) {
        out.par_chunks_mut(SEGMENT_SIZE)
            .zip(input.par_chunks(SEGMENT_SIZE))
            .enumerate()
            .for_each(|(i, (out, input))| {
                let segment_key = self.segment_key(i as u32);
                for ((o, b), k) in out.iter_mut().zip(input).zip(segment_key.iter()) {
                    *o = b ^ k;
                }
            });
    }

    fn segment_key(&self, index: u32) -> B256 {
        let mut counter = [0u8; KEY_LENGTH + 4];
        counter[..KEY_LENGTH].copy_from_slice(self.key.as_slice());
        counter[KEY_LENGTH..].copy_from_slice(&index.wrapping_add(self.init_ctr).to_le_bytes());
        keccak256(keccak256(counter))
    }
}

/// Generate a fresh random chunk key.
pub fn generate_key() -> EncryptionKey {
    B256::from(rand::random::<[u8; KEY_LENGTH]>())
}

/// Encrypt a `span ++ payload` chunk under a fresh key.
///
/// The result is the encrypted span followed by the payload padded to a full
/// chunk.
pub fn encrypt_chunk(data: &[u8]) -> Result<(EncryptionKey, Bytes)> {
    if data.len() < SPAN_SIZE {
        return Err(FileError::decryption("chunk shorter than its span"));
    }
    let key = generate_key();
    let span = Encryption::span(key).encrypt(&data[..SPAN_SIZE])?;
    let payload = Encryption::data(key).encrypt(&data[SPAN_SIZE..])?;

    let mut out = BytesMut::with_capacity(span.len() + payload.len());
    out.put_slice(&span);
    out.put_slice(&payload);
    Ok((key, out.freeze()))
}

/// Decrypt the data of an encrypted chunk, returning the plaintext span and
/// the payload trimmed to its true length.
///
/// Payloads are always padded to a full chunk. For a leaf the true length is
/// the span itself; for an intermediate chunk it is the size of the reference
/// array, derived from the span by repeatedly counting chunks one level down.
pub fn decrypt_chunk(data: &[u8], key: &EncryptionKey) -> Result<(u64, Bytes)> {
    if data.len() < SPAN_SIZE {
        return Err(FileError::decryption("chunk shorter than its span"));
    }
    let span_bytes = Encryption::span(*key).decrypt(&data[..SPAN_SIZE])?;
    let span = u64::from_le_bytes(
        span_bytes.as_slice().try_into().map_err(|_| FileError::decryption("malformed span"))?,
    );
    let mut payload = Encryption::data(*key).decrypt(&data[SPAN_SIZE..])?;

    let len = payload_len(span);
    let len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= payload.len())
        .ok_or_else(|| FileError::corrupt(format!("span {span} exceeds chunk payload")))?;
    payload.truncate(len);
    Ok((span, Bytes::from(payload)))
}

fn payload_len(span: u64) -> u64 {
    let chunk = MAX_CHUNK_SIZE as u64;
    let mut len = span;
    while len > chunk {
        len = len.div_ceil(chunk) * ENCRYPTED_REFERENCE_SIZE as u64;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_with_padding() {
        let cipher = Encryption::data(generate_key());
        let plain = b"the quick brown fox jumps over the lazy dog".to_vec();

        let encrypted = cipher.encrypt(&plain).unwrap();
        assert_eq!(encrypted.len(), MAX_CHUNK_SIZE);
        assert_ne!(&encrypted[..plain.len()], plain.as_slice());

        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(&decrypted[..plain.len()], plain.as_slice());
    }

    #[test]
    fn test_decrypt_requires_padded_length() {
        let cipher = Encryption::data(generate_key());
        assert!(matches!(cipher.decrypt(&[0; 100]), Err(FileError::Decryption(_))));
        assert!(cipher.encrypt(&[0; MAX_CHUNK_SIZE + 1]).is_err());
    }

    #[test]
    fn test_keystream_is_deterministic() {
        let key = B256::repeat_byte(9);
        let a = Encryption::new(key, 0, 0).encrypt(&[0; 64]).unwrap();
        let b = Encryption::new(key, 0, 0).encrypt(&[0; 64]).unwrap();
        assert_eq!(a, b);

        // second segment of one stream is the first of a stream shifted by one
        let shifted = Encryption::new(key, 0, 1).encrypt(&[0; 32]).unwrap();
        assert_eq!(&a[32..], shifted.as_slice());
    }

    #[test]
    fn test_span_and_data_keystreams_differ() {
        let key = generate_key();
        let span = Encryption::span(key).encrypt(&[0; 8]).unwrap();
        let data = Encryption::data(key).encrypt(&[0; 8]).unwrap();
        assert_ne!(span.as_slice(), &data[..8]);
    }

    #[test]
    fn test_leaf_chunk_roundtrip() {
        let mut chunk = 5u64.to_le_bytes().to_vec();
        chunk.extend_from_slice(b"hello");

        let (key, encrypted) = encrypt_chunk(&chunk).unwrap();
        assert_eq!(encrypted.len(), SPAN_SIZE + MAX_CHUNK_SIZE);

        let (span, payload) = decrypt_chunk(&encrypted, &key).unwrap();
        assert_eq!(span, 5);
        assert_eq!(payload.as_ref(), b"hello");
    }

    #[test]
    fn test_intermediate_payload_length() {
        let chunk = MAX_CHUNK_SIZE as u64;
        assert_eq!(payload_len(0), 0);
        assert_eq!(payload_len(chunk), chunk);
        assert_eq!(payload_len(chunk + 1), 128);
        assert_eq!(payload_len(chunk * 64), 4096);
        assert_eq!(payload_len(chunk * 64 + 1), 128);
        assert_eq!(payload_len(chunk * 64 * 64), 4096);
        assert_eq!(payload_len(chunk * 64 * 64 + 1), 128);
        assert_eq!(payload_len(chunk * 64 * 64 * 2 + 5), 192);
    }
}
