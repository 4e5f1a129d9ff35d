//! Store capabilities.
//!
//! Each capability is a separate trait so that components ask for no more
//! than they use: the joiner needs only a [`Getter`], the pipeline only a
//! [`Putter`]. Methods return `Send` futures so that concurrent fetches can
//! be driven from any executor.

use std::future::Future;
use std::sync::Arc;

use nectar_primitives::SwarmAddress;

use crate::{ModeGet, ModePut, Result, StoredChunk};

/// Read a chunk by address.
pub trait Getter: Send + Sync {
    /// Fetch the chunk stored under `address`.
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound)
    /// when the chunk is unavailable.
    fn get(
        &self,
        mode: ModeGet,
        address: &SwarmAddress,
    ) -> impl Future<Output = Result<StoredChunk>> + Send;
}

/// Write chunks.
pub trait Putter: Send + Sync {
    /// Store `chunks`, returning for each whether it was already present.
    fn put(
        &self,
        mode: ModePut,
        chunks: &[StoredChunk],
    ) -> impl Future<Output = Result<Vec<bool>>> + Send;
}

/// Check presence of a chunk.
pub trait Has: Send + Sync {
    /// Whether a chunk is stored under `address`.
    fn has(&self, address: &SwarmAddress) -> impl Future<Output = Result<bool>> + Send;
}

/// A store offering all three capabilities.
pub trait ChunkStore: Getter + Putter + Has {}

impl<T: Getter + Putter + Has> ChunkStore for T {}

impl<T: Getter> Getter for &T {
    fn get(
        &self,
        mode: ModeGet,
        address: &SwarmAddress,
    ) -> impl Future<Output = Result<StoredChunk>> + Send {
        (**self).get(mode, address)
    }
}

impl<T: Getter> Getter for Arc<T> {
    fn get(
        &self,
        mode: ModeGet,
        address: &SwarmAddress,
    ) -> impl Future<Output = Result<StoredChunk>> + Send {
        (**self).get(mode, address)
    }
}

impl<T: Putter> Putter for &T {
    fn put(
        &self,
        mode: ModePut,
        chunks: &[StoredChunk],
    ) -> impl Future<Output = Result<Vec<bool>>> + Send {
        (**self).put(mode, chunks)
    }
}

impl<T: Putter> Putter for Arc<T> {
    fn put(
        &self,
        mode: ModePut,
        chunks: &[StoredChunk],
    ) -> impl Future<Output = Result<Vec<bool>>> + Send {
        (**self).put(mode, chunks)
    }
}

impl<T: Has> Has for &T {
    fn has(&self, address: &SwarmAddress) -> impl Future<Output = Result<bool>> + Send {
        (**self).has(address)
    }
}

impl<T: Has> Has for Arc<T> {
    fn has(&self, address: &SwarmAddress) -> impl Future<Output = Result<bool>> + Send {
        (**self).has(address)
    }
}
