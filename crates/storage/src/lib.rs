//! Chunk storage capabilities for Ethereum Swarm
//!
//! This crate defines the narrow interfaces through which the chunking
//! pipeline, the joiner and the network store reach persisted chunks:
//!
//! - [`Getter`], [`Putter`] and [`Has`]: async capabilities over a store,
//!   combined as [`ChunkStore`]
//! - [`ModeGet`] / [`ModePut`]: why a chunk is being read or written
//! - [`StoredChunk`]: a chunk as the store sees it, address plus wire bytes
//!   and an optional postage stamp
//!
//! Two implementations ship with the crate: [`MemoryStore`], an in-memory
//! store for tests and light clients, and [`StampingPutter`], which attaches
//! postage stamps before delegating to another putter.
//!
//! ```
//! use nectar_storage::{Getter, MemoryStore, ModeGet, ModePut, Putter, StoredChunk};
//! use nectar_primitives::ContentChunk;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let chunk = StoredChunk::from(&ContentChunk::new(b"hello".as_slice()).unwrap());
//!
//! let existed = store.put(ModePut::Upload, &[chunk.clone()]).await.unwrap();
//! assert_eq!(existed, vec![false]);
//!
//! let fetched = store.get(ModeGet::Request, chunk.address()).await.unwrap();
//! assert_eq!(fetched.data(), chunk.data());
//! # });
//! ```

mod chunk;
mod error;
mod memory;
mod mode;
mod stamper;
mod traits;

pub use chunk::{StoredChunk, Targets};
pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use mode::{ModeGet, ModePut};
pub use stamper::{Stamper, StampingPutter};
pub use traits::{ChunkStore, Getter, Has, Putter};
