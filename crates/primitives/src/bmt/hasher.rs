//! Binary Merkle Tree hasher
//!
//! Computes the Swarm content address of a chunk: the payload is zero-padded
//! to [`MAX_DATA_LENGTH`] bytes, reduced pairwise with Keccak256 over 32-byte
//! segments, and the resulting root is hashed together with the
//! little-endian span.

use alloy_primitives::{B256, Keccak256};
use bytes::Bytes;
use digest::{FixedOutput, FixedOutputReset, OutputSizeUser, Reset, Update};
use generic_array::{GenericArray, typenum::U32};
use std::io::{self, Write};
use std::sync::LazyLock;

use super::constants::*;
use super::error::{BmtError, Result};

/// Roots of all-zero subtrees, indexed by height above a segment pair.
///
/// Index 0 covers 64 bytes, index 6 covers the whole 4096-byte tree.
static ZERO_HASHES: LazyLock<[B256; ZERO_TREE_LEVELS]> = LazyLock::new(|| {
    let mut hashes = [B256::ZERO; ZERO_TREE_LEVELS];
    hashes[0] = keccak_pair(&[0u8; SEGMENT_SIZE], &[0u8; SEGMENT_SIZE]);
    for level in 1..ZERO_TREE_LEVELS {
        hashes[level] = keccak_pair(hashes[level - 1].as_slice(), hashes[level - 1].as_slice());
    }
    hashes
});

#[inline(always)]
fn keccak_pair(left: &[u8], right: &[u8]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize()
}

/// BMT hasher over a single chunk payload of at most 4096 bytes.
///
/// A hasher is stateful: set the span, write the payload, then call
/// [`sum`](Self::sum). [`reset`](Reset::reset) makes it reusable, which is
/// what [`HasherPool`](super::HasherPool) relies on.
#[derive(Debug, Clone)]
pub struct Hasher {
    span: u64,
    buffer: [u8; MAX_DATA_LENGTH],
    cursor: usize,
}

impl Default for Hasher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create an empty hasher with a zero span.
    #[inline]
    pub const fn new() -> Self {
        Self { span: 0, buffer: [0u8; MAX_DATA_LENGTH], cursor: 0 }
    }

    /// Set the span that is mixed into the final hash.
    ///
    /// For leaf chunks this is the payload length, for intermediate chunks
    /// the number of data bytes in the subtree.
    #[inline]
    pub fn set_span(&mut self, span: u64) {
        self.span = span;
    }

    /// Current span.
    #[inline(always)]
    pub const fn span(&self) -> u64 {
        self.span
    }

    /// Number of payload bytes written so far.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.cursor
    }

    /// Whether nothing has been written yet.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Remaining payload capacity.
    #[inline(always)]
    pub const fn remaining(&self) -> usize {
        MAX_DATA_LENGTH - self.cursor
    }

    /// Append payload bytes, returning how many were accepted.
    ///
    /// Bytes beyond the 4096-byte capacity are dropped.
    #[inline]
    pub fn update(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining());
        self.buffer[self.cursor..self.cursor + n].copy_from_slice(&data[..n]);
        self.cursor += n;
        n
    }

    /// Append the whole of `data` or fail with [`BmtError::ShortWrite`].
    pub fn write_exact(&mut self, data: &[u8]) -> Result<()> {
        let written = self.update(data);
        if written != data.len() {
            return Err(BmtError::short_write(written, data.len()));
        }
        Ok(())
    }

    /// Compute the chunk address: `keccak256(span_le ++ bmt_root(payload))`.
    ///
    /// Does not modify the hasher.
    #[inline]
    #[must_use]
    pub fn sum(&self) -> B256 {
        let root = self.root();
        let mut hasher = Keccak256::new();
        hasher.update(self.span.to_le_bytes());
        hasher.update(root.as_slice());
        hasher.finalize()
    }

    /// Payload written so far.
    #[inline]
    #[must_use]
    pub fn data(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buffer[..self.cursor])
    }

    /// Root of the binary merkle tree over the zero-padded payload.
    ///
    /// Only the smallest power-of-two prefix containing data is hashed; the
    /// rest of the tree is folded in from [`ZERO_HASHES`].
    fn root(&self) -> B256 {
        if self.cursor == 0 {
            return ZERO_HASHES[ZERO_TREE_LEVELS - 1];
        }

        let width = self.cursor.next_power_of_two().clamp(SEGMENT_PAIR_LENGTH, MAX_DATA_LENGTH);
        let mut node = self.subtree(&self.buffer[..width], 0);

        let mut covered = width;
        while covered < MAX_DATA_LENGTH {
            node = keccak_pair(node.as_slice(), ZERO_HASHES[zero_level(covered)].as_slice());
            covered *= 2;
        }
        node
    }

    /// Hash a power-of-two subtree starting at byte `offset` of the buffer.
    fn subtree(&self, data: &[u8], offset: usize) -> B256 {
        let width = data.len();
        debug_assert!(width.is_power_of_two() && width >= SEGMENT_PAIR_LENGTH);

        if width == SEGMENT_PAIR_LENGTH {
            let (left, right) = data.split_at(SEGMENT_SIZE);
            return keccak_pair(left, right);
        }

        let half = width / 2;
        let (left, right) = data.split_at(half);
        let (l, r) = if offset + half >= self.cursor {
            (self.subtree(left, offset), ZERO_HASHES[zero_level(half)])
        } else {
            rayon::join(|| self.subtree(left, offset), || self.subtree(right, offset + half))
        };
        keccak_pair(l.as_slice(), r.as_slice())
    }

    #[inline(always)]
    fn clear(&mut self) {
        // `root` hashes past the cursor up to the next power of two, so those bytes must be zero
        self.buffer[..self.cursor].fill(0);
        self.cursor = 0;
        self.span = 0;
    }
}

/// Zero-tree level for a power-of-two width between 64 and 4096 bytes.
#[inline(always)]
const fn zero_level(width: usize) -> usize {
    width.trailing_zeros() as usize - SEGMENT_PAIR_LENGTH.trailing_zeros() as usize
}

impl Write for Hasher {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.update(buf))
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputSizeUser for Hasher {
    type OutputSize = U32;
}

impl Update for Hasher {
    #[inline]
    fn update(&mut self, data: &[u8]) {
        Hasher::update(self, data);
    }
}

impl Reset for Hasher {
    #[inline]
    fn reset(&mut self) {
        self.clear();
    }
}

impl FixedOutput for Hasher {
    #[inline]
    fn finalize_into(self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(self.sum().as_slice());
    }
}

impl FixedOutputReset for Hasher {
    #[inline]
    fn finalize_into_reset(&mut self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(self.sum().as_slice());
        self.clear();
    }
}

impl digest::HashMarker for Hasher {}
