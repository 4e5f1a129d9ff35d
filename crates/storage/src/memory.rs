//! In-memory chunk store
//!
//! Used for tests and development. Not persistent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use nectar_primitives::SwarmAddress;
use parking_lot::RwLock;
use tracing::trace;

use crate::{Getter, Has, ModeGet, ModePut, Putter, Result, StorageError, StoredChunk};

#[derive(Debug, Clone)]
struct Entry {
    chunk: StoredChunk,
    mode: ModePut,
    pinned: bool,
}

/// A [`ChunkStore`](crate::ChunkStore) backed by a hash map.
///
/// Records the mode each chunk was first written with and whether it has
/// been pinned since, so callers can observe how chunks entered the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<SwarmAddress, Entry>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether the store holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Mode the chunk was first stored with
    pub fn mode_of(&self, address: &SwarmAddress) -> Option<ModePut> {
        self.chunks.read().get(address).map(|entry| entry.mode)
    }

    /// Whether the chunk is pinned
    pub fn is_pinned(&self, address: &SwarmAddress) -> bool {
        self.chunks.read().get(address).is_some_and(|entry| entry.pinned)
    }

    /// Addresses of all stored chunks, in no particular order
    pub fn addresses(&self) -> Vec<SwarmAddress> {
        self.chunks.read().keys().copied().collect()
    }

    /// Look a chunk up without going through the async interface
    pub fn chunk(&self, address: &SwarmAddress) -> Option<StoredChunk> {
        self.chunks.read().get(address).map(|entry| entry.chunk.clone())
    }

    /// Replace the bytes stored under an address, keeping mode and pin state
    pub fn overwrite(&self, chunk: StoredChunk) {
        let mut chunks = self.chunks.write();
        match chunks.get_mut(chunk.address()) {
            Some(entry) => entry.chunk = chunk,
            None => {
                chunks.insert(*chunk.address(), Entry { chunk, mode: ModePut::Upload, pinned: false });
            }
        }
    }

    /// Remove a chunk, returning whether it was present
    pub fn remove(&self, address: &SwarmAddress) -> bool {
        self.chunks.write().remove(address).is_some()
    }

    /// Number of successful reads served
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of chunks newly written
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Getter for MemoryStore {
    async fn get(&self, mode: ModeGet, address: &SwarmAddress) -> Result<StoredChunk> {
        let chunk = {
            let mut chunks = self.chunks.write();
            let entry = chunks.get_mut(address).ok_or(StorageError::NotFound(*address))?;
            if mode == ModeGet::RequestPin {
                entry.pinned = true;
            }
            entry.chunk.clone()
        };
        self.reads.fetch_add(1, Ordering::Relaxed);
        trace!(address = %address, %mode, "get chunk");
        Ok(chunk)
    }
}

impl Putter for MemoryStore {
    async fn put(&self, mode: ModePut, chunks: &[StoredChunk]) -> Result<Vec<bool>> {
        let mut stored = self.chunks.write();
        let exists = chunks
            .iter()
            .map(|chunk| {
                if let Some(entry) = stored.get_mut(chunk.address()) {
                    entry.pinned |= mode.is_pin();
                    return true;
                }
                trace!(address = %chunk.address(), %mode, "put chunk");
                stored.insert(
                    *chunk.address(),
                    Entry { chunk: chunk.clone(), mode, pinned: mode.is_pin() },
                );
                self.writes.fetch_add(1, Ordering::Relaxed);
                false
            })
            .collect();
        Ok(exists)
    }
}

impl Has for MemoryStore {
    async fn has(&self, address: &SwarmAddress) -> Result<bool> {
        Ok(self.chunks.read().contains_key(address))
    }
}
