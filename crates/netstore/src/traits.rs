//! Collaborators of the network store.

use std::future::Future;

use futures::future::BoxFuture;
use nectar_primitives::SwarmAddress;
use nectar_storage::{StoredChunk, Targets};

use crate::{RecoveryError, Result, RetrievalError};

/// Fetches chunks from peers.
pub trait Retrieval: Send + Sync {
    /// Request the chunk under `address` from the network.
    fn retrieve_chunk(
        &self,
        address: &SwarmAddress,
    ) -> impl Future<Output = std::result::Result<StoredChunk, RetrievalError>> + Send;
}

/// Asks target peers to re-upload a chunk the network could not deliver.
///
/// The returned future is run detached; its outcome is only logged.
pub trait Recovery: Send + Sync {
    /// Start recovery of `address` from `targets`.
    fn recover(
        &self,
        address: SwarmAddress,
        targets: Targets,
    ) -> BoxFuture<'static, std::result::Result<(), RecoveryError>>;
}

impl<F> Recovery for F
where
    F: Fn(SwarmAddress, Targets) -> BoxFuture<'static, std::result::Result<(), RecoveryError>>
        + Send
        + Sync,
{
    fn recover(
        &self,
        address: SwarmAddress,
        targets: Targets,
    ) -> BoxFuture<'static, std::result::Result<(), RecoveryError>> {
        self(address, targets)
    }
}

/// Checks the postage stamp of a chunk received from the network.
pub trait StampValidator: Send + Sync {
    /// Validate `stamp` for `chunk`, returning the chunk to store.
    fn validate(&self, chunk: &StoredChunk, stamp: &[u8]) -> Result<StoredChunk>;
}

impl<F> StampValidator for F
where
    F: Fn(&StoredChunk, &[u8]) -> Result<StoredChunk> + Send + Sync,
{
    fn validate(&self, chunk: &StoredChunk, stamp: &[u8]) -> Result<StoredChunk> {
        self(chunk, stamp)
    }
}
