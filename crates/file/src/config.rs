//! Pipeline and joiner options.

use nectar_primitives::MAX_CHUNK_SIZE;
use nectar_storage::ModePut;

pub use nectar_primitives::bmt::DEFAULT_POOL_CAPACITY;

/// Options for building a write pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct PipelineConfig {
    /// Mode chunks are stored with
    pub mode: ModePut,
    /// Whether chunks are encrypted
    pub encrypt: bool,
    /// Idle hashers kept for reuse
    pub pool_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { mode: ModePut::Upload, encrypt: false, pool_capacity: DEFAULT_POOL_CAPACITY }
    }
}

impl PipelineConfig {
    /// Set the store mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ModePut) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable encryption.
    #[must_use]
    pub const fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Set the hasher pool capacity.
    #[must_use]
    pub const fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

/// Read-ahead sizing for streaming downloads.
///
/// Larger content gets a larger look-ahead so more chunk fetches are in
/// flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct ReadAheadConfig {
    /// Look-ahead in bytes for content up to the threshold
    pub small_buffer: usize,
    /// Look-ahead in bytes for content above the threshold
    pub large_buffer: usize,
    /// Content length above which the large buffer is used
    pub large_threshold: u64,
}

impl Default for ReadAheadConfig {
    fn default() -> Self {
        Self { small_buffer: 8 * 32 * 1024, large_buffer: 16 * 32 * 1024, large_threshold: 10_000_000 }
    }
}

impl ReadAheadConfig {
    /// Set the small look-ahead.
    #[must_use]
    pub const fn with_small_buffer(mut self, bytes: usize) -> Self {
        self.small_buffer = bytes;
        self
    }

    /// Set the large look-ahead.
    #[must_use]
    pub const fn with_large_buffer(mut self, bytes: usize) -> Self {
        self.large_buffer = bytes;
        self
    }

    /// Set the size threshold.
    #[must_use]
    pub const fn with_large_threshold(mut self, bytes: u64) -> Self {
        self.large_threshold = bytes;
        self
    }

    /// Look-ahead in bytes for content of `size` bytes
    pub const fn buffer_size(&self, size: u64) -> usize {
        if size > self.large_threshold { self.large_buffer } else { self.small_buffer }
    }

    /// Number of chunk windows fetched ahead for content of `size` bytes,
    /// at least one.
    pub const fn windows(&self, size: u64) -> usize {
        let windows = self.buffer_size(size) / MAX_CHUNK_SIZE;
        if windows == 0 { 1 } else { windows }
    }
}
