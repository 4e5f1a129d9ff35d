//! Constants used in the Binary Merkle Tree implementation

/// Hash size in bytes (keccak256)
pub const HASH_SIZE: usize = 32;

/// Size of a segment in the BMT (same as hash size)
pub const SEGMENT_SIZE: usize = HASH_SIZE;

/// Length of a segment pair (two segments)
pub(crate) const SEGMENT_PAIR_LENGTH: usize = 2 * SEGMENT_SIZE;

/// Number of branches in the Binary Merkle Tree
pub const BRANCHES: usize = 128;

/// Maximum payload carried by a single chunk (128 branches * 32 byte segments = 4096)
pub const MAX_DATA_LENGTH: usize = BRANCHES * SEGMENT_SIZE;

/// Size of the little-endian span header preceding every chunk payload
pub const SPAN_SIZE: usize = std::mem::size_of::<u64>();

/// Number of levels in the zero-tree cache.
/// Level 0 = hash of 64 zero bytes, level 6 = hash of the full 4096-byte zero tree.
pub(crate) const ZERO_TREE_LEVELS: usize = 7;

/// Default number of idle hashers kept by a [`HasherPool`](super::HasherPool).
pub const DEFAULT_POOL_CAPACITY: usize = 32;
