//! Observes the chunks a read touches.

use nectar_primitives::SwarmAddress;
use nectar_storage::{Getter, ModeGet, Result, StoredChunk};

/// A [`Getter`] that reports the address of every chunk it serves.
///
/// Joining content through it enumerates all chunks of the tree.
#[derive(Debug, Clone)]
pub struct AddressesGetter<G, F> {
    inner: G,
    on_address: F,
}

impl<G, F> AddressesGetter<G, F>
where
    G: Getter,
    F: Fn(&SwarmAddress) + Send + Sync,
{
    /// Wrap `inner`, calling `on_address` after each successful get.
    pub const fn new(inner: G, on_address: F) -> Self {
        Self { inner, on_address }
    }
}

impl<G, F> Getter for AddressesGetter<G, F>
where
    G: Getter,
    F: Fn(&SwarmAddress) + Send + Sync,
{
    async fn get(&self, mode: ModeGet, address: &SwarmAddress) -> Result<StoredChunk> {
        let chunk = self.inner.get(mode, address).await?;
        (self.on_address)(address);
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Joiner, Pipeline};
    use nectar_primitives::MAX_CHUNK_SIZE;
    use nectar_storage::{MemoryStore, ModePut};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_join_visits_every_chunk() {
        let store = MemoryStore::new();
        let data: Vec<u8> = (0..MAX_CHUNK_SIZE * 130).map(|i| (i % 251) as u8).collect();
        let mut pipeline = Pipeline::new(&store, ModePut::Upload, false);
        pipeline.write(&data).await.unwrap();
        let root = pipeline.sum().await.unwrap();

        let seen = Mutex::new(HashSet::new());
        let getter = AddressesGetter::new(&store, |address: &SwarmAddress| {
            seen.lock().insert(*address);
        });
        Joiner::open(&getter, &root).await.unwrap().read_all().await.unwrap();

        let expected: HashSet<_> = store.addresses().into_iter().collect();
        assert_eq!(seen.into_inner(), expected);
    }
}
