//! Local store with network fallback.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use nectar_primitives::SwarmAddress;
use nectar_storage::{
    Getter, Has, ModeGet, ModePut, Putter, Result, StorageError, StoredChunk, Targets,
};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::{Recovery, Retrieval, StampValidator};

/// A chunk store that retrieves missing chunks from the network.
///
/// Reads are served from the local store when possible. On a miss the chunk
/// is requested through the [`Retrieval`] collaborator, checked against its
/// address, and stored locally: with [`ModePut::Request`] when its stamp
/// validates and with [`ModePut::RequestCache`] when it does not. Either
/// way the chunk is returned, since its integrity follows from the address.
///
/// If retrieval fails and the read carries [`Targets`], the configured
/// [`Recovery`] is started in the background and the read fails with
/// [`StorageError::RecoveryInitiated`] so the caller can retry later.
pub struct NetStore<S, R, V> {
    store: S,
    retrieval: R,
    validator: V,
    recovery: Option<Arc<dyn Recovery>>,
}

impl<S: fmt::Debug, R: fmt::Debug, V> fmt::Debug for NetStore<S, R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetStore")
            .field("store", &self.store)
            .field("retrieval", &self.retrieval)
            .field("recovery", &self.recovery.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, R, V> NetStore<S, R, V>
where
    S: Getter + Putter,
    R: Retrieval,
    V: StampValidator,
{
    /// Wrap `store`, falling back to `retrieval` and validating stamps with
    /// `validator`.
    pub const fn new(store: S, retrieval: R, validator: V) -> Self {
        Self { store, retrieval, validator, recovery: None }
    }

    /// Start `recovery` for chunks that cannot be retrieved.
    #[must_use]
    pub fn with_recovery(mut self, recovery: impl Recovery + 'static) -> Self {
        self.recovery = Some(Arc::new(recovery));
        self
    }

    /// The local store
    pub const fn local(&self) -> &S {
        &self.store
    }

    /// A [`Getter`] whose reads carry `targets` for recovery.
    pub const fn with_targets(&self, targets: Targets) -> WithTargets<'_, S, R, V> {
        WithTargets { store: self, targets }
    }

    /// Read a chunk, passing `targets` to recovery if retrieval fails.
    pub async fn get_with_targets(
        &self,
        mode: ModeGet,
        address: &SwarmAddress,
        targets: Option<&Targets>,
    ) -> Result<StoredChunk> {
        match self.store.get(mode, address).await {
            Err(StorageError::NotFound(_)) => {}
            local => return local,
        }

        debug!(%address, "chunk not found locally, retrieving from network");
        let chunk = match self.retrieval.retrieve_chunk(address).await {
            Ok(chunk) => chunk,
            Err(err) => {
                debug!(%address, %err, "retrieval failed");
                return Err(self.recover(address, targets));
            }
        };
        if chunk.address() != address || !chunk.is_valid() {
            warn!(%address, "retrieved chunk does not match its address");
            return Err(StorageError::InvalidChunk(*address));
        }

        let stamp = chunk.stamp().cloned().unwrap_or_default();
        let (put_mode, stored) = match self.validator.validate(&chunk, &stamp) {
            Ok(valid) if mode == ModeGet::RequestPin => (ModePut::RequestPin, valid),
            Ok(valid) => (ModePut::Request, valid),
            Err(err) => {
                warn!(%address, %err, "retrieved chunk has invalid stamp, caching");
                (ModePut::RequestCache, chunk.clone())
            }
        };
        self.store.put(put_mode, &[stored]).await?;
        trace!(%address, mode = %put_mode, "stored retrieved chunk");
        Ok(chunk)
    }

    /// Start recovery if possible and return the error for the caller.
    fn recover(&self, address: &SwarmAddress, targets: Option<&Targets>) -> StorageError {
        let (Some(recovery), Some(targets)) = (&self.recovery, targets) else {
            return StorageError::NotFound(*address);
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(%address, "no runtime to run recovery on");
            return StorageError::NotFound(*address);
        };

        let request = recovery.recover(*address, targets.clone());
        let address = *address;
        runtime.spawn(async move {
            if let Err(err) = request.await {
                warn!(%address, %err, "chunk recovery failed");
            }
        });
        debug!(%address, targets = targets.len(), "chunk recovery initiated");
        StorageError::RecoveryInitiated(address)
    }
}

impl<S, R, V> Getter for NetStore<S, R, V>
where
    S: Getter + Putter,
    R: Retrieval,
    V: StampValidator,
{
    fn get(
        &self,
        mode: ModeGet,
        address: &SwarmAddress,
    ) -> impl Future<Output = Result<StoredChunk>> + Send {
        self.get_with_targets(mode, address, None)
    }
}

impl<S: Putter, R: Send + Sync, V: Send + Sync> Putter for NetStore<S, R, V> {
    fn put(
        &self,
        mode: ModePut,
        chunks: &[StoredChunk],
    ) -> impl Future<Output = Result<Vec<bool>>> + Send {
        self.store.put(mode, chunks)
    }
}

impl<S: Has, R: Send + Sync, V: Send + Sync> Has for NetStore<S, R, V> {
    fn has(&self, address: &SwarmAddress) -> impl Future<Output = Result<bool>> + Send {
        self.store.has(address)
    }
}

/// A view of a [`NetStore`] whose reads carry recovery targets.
#[derive(Debug)]
pub struct WithTargets<'a, S, R, V> {
    store: &'a NetStore<S, R, V>,
    targets: Targets,
}

impl<S, R, V> Getter for WithTargets<'_, S, R, V>
where
    S: Getter + Putter,
    R: Retrieval,
    V: StampValidator,
{
    fn get(
        &self,
        mode: ModeGet,
        address: &SwarmAddress,
    ) -> impl Future<Output = Result<StoredChunk>> + Send {
        self.store.get_with_targets(mode, address, Some(&self.targets))
    }
}
