//! Network-backed chunk store for Ethereum Swarm
//!
//! [`NetStore`] wraps a local [`ChunkStore`](nectar_storage::ChunkStore) and
//! serves chunks it does not hold from the network. It is itself a
//! [`Getter`](nectar_storage::Getter), so content can be joined straight
//! from the swarm:
//!
//! - [`Retrieval`] fetches a chunk from peers
//! - [`StampValidator`] decides whether a retrieved chunk is stored as a
//!   regular request or only cached
//! - [`Recovery`] asks target peers to re-upload chunks the network lost;
//!   it runs in the background and never blocks a read
//!
//! ```
//! use nectar_netstore::{NetStore, NetStoreError, RetrievalError, Retrieval};
//! use nectar_primitives::SwarmAddress;
//! use nectar_storage::{Getter, MemoryStore, ModeGet, StorageError, StoredChunk};
//!
//! struct Offline;
//!
//! impl Retrieval for Offline {
//!     async fn retrieve_chunk(&self, address: &SwarmAddress) -> Result<StoredChunk, RetrievalError> {
//!         Err(RetrievalError::NotFound(*address))
//!     }
//! }
//!
//! let accept = |chunk: &StoredChunk, _: &[u8]| -> Result<StoredChunk, NetStoreError> { Ok(chunk.clone()) };
//! let netstore = NetStore::new(MemoryStore::new(), Offline, accept);
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let missing = SwarmAddress::new([1; 32]);
//! let result = netstore.get(ModeGet::Request, &missing).await;
//! assert!(matches!(result, Err(StorageError::NotFound(_))));
//! # });
//! ```

mod error;
mod store;
mod traits;

pub use error::{NetStoreError, RecoveryError, Result, RetrievalError};
pub use store::{NetStore, WithTargets};
pub use traits::{Recovery, Retrieval, StampValidator};
