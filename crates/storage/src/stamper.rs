//! Postage stamping on the write path.

use std::collections::HashSet;
use std::future::Future;

use bytes::Bytes;
use nectar_primitives::SwarmAddress;
use tracing::trace;

use crate::{Has, ModePut, Putter, Result, StoredChunk};

/// Issues postage stamps for chunk addresses.
///
/// Issuing a stamp consumes capacity of a postage batch, so stampers are
/// only asked for chunks that are not yet stored.
pub trait Stamper: Send + Sync {
    /// Issue a serialized stamp for `address`.
    fn stamp(&self, address: &SwarmAddress) -> Result<Bytes>;
}

impl<F> Stamper for F
where
    F: Fn(&SwarmAddress) -> Result<Bytes> + Send + Sync,
{
    fn stamp(&self, address: &SwarmAddress) -> Result<Bytes> {
        self(address)
    }
}

/// A [`Putter`] that stamps new chunks before handing them to an inner store.
///
/// Chunks that the inner store already holds, or that occur earlier in the
/// same batch, are neither stamped nor written again and are reported as
/// existing.
#[derive(Debug, Clone)]
pub struct StampingPutter<P, S> {
    inner: P,
    stamper: S,
}

impl<P, S> StampingPutter<P, S> {
    /// Wrap `inner`, stamping through `stamper`.
    pub const fn new(inner: P, stamper: S) -> Self {
        Self { inner, stamper }
    }

    /// The wrapped store
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P, S> Putter for StampingPutter<P, S>
where
    P: Putter + Has,
    S: Stamper,
{
    async fn put(&self, mode: ModePut, chunks: &[StoredChunk]) -> Result<Vec<bool>> {
        let mut exists = vec![true; chunks.len()];
        let mut fresh = Vec::with_capacity(chunks.len());
        let mut fresh_index = Vec::with_capacity(chunks.len());
        let mut seen = HashSet::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            if !seen.insert(*chunk.address()) || self.inner.has(chunk.address()).await? {
                continue;
            }
            let stamp = self.stamper.stamp(chunk.address())?;
            trace!(address = %chunk.address(), "stamped chunk");
            fresh.push(chunk.clone().with_stamp(stamp));
            fresh_index.push(i);
        }

        if fresh.is_empty() {
            return Ok(exists);
        }
        let stored = self.inner.put(mode, &fresh).await?;
        for (i, existed) in fresh_index.into_iter().zip(stored) {
            exists[i] = existed;
        }
        Ok(exists)
    }
}

impl<P: Has, S: Send + Sync> Has for StampingPutter<P, S> {
    fn has(&self, address: &SwarmAddress) -> impl Future<Output = Result<bool>> + Send {
        self.inner.has(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Getter, MemoryStore, ModeGet, StorageError};
    use nectar_primitives::ContentChunk;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chunk(payload: &[u8]) -> StoredChunk {
        StoredChunk::from(ContentChunk::new(payload.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_stamps_only_new_chunks() {
        let store = MemoryStore::new();
        let (a, b) = (chunk(b"alpha"), chunk(b"beta"));
        store.put(ModePut::Upload, &[a.clone()]).await.unwrap();

        let issued = AtomicUsize::new(0);
        let stamper = |_: &SwarmAddress| -> Result<Bytes> {
            issued.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"stamp"))
        };
        let putter = StampingPutter::new(&store, stamper);

        let exists = putter.put(ModePut::Upload, &[a.clone(), b.clone(), b.clone()]).await.unwrap();
        assert_eq!(exists, vec![true, false, true]);
        assert_eq!(issued.load(Ordering::SeqCst), 1);

        let stored = store.get(ModeGet::Lookup, b.address()).await.unwrap();
        assert_eq!(stored.stamp().map(|s| &s[..]), Some(b"stamp".as_slice()));
        assert_eq!(store.get(ModeGet::Lookup, a.address()).await.unwrap().stamp(), None);
    }

    #[tokio::test]
    async fn test_stamp_failure_aborts_put() {
        let store = MemoryStore::new();
        let stamper = |_: &SwarmAddress| -> Result<Bytes> { Err(StorageError::stamp("batch full")) };
        let putter = StampingPutter::new(&store, stamper);

        let result = putter.put(ModePut::Upload, &[chunk(b"alpha")]).await;
        assert!(matches!(result, Err(StorageError::Stamp(_))));
        assert!(store.is_empty());
    }
}
