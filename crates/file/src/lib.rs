//! Content chunking and reassembly for Ethereum Swarm
//!
//! Content of any length is stored as a tree of chunks. Leaves carry up to
//! 4096 bytes of content each; intermediate chunks carry the references of
//! their children, and every chunk's span records the content length below
//! it. This crate builds such trees and reads them back:
//!
//! - [`Pipeline`]: splits content into chunks, optionally encrypts them,
//!   stores them through a [`Putter`](nectar_storage::Putter) and returns
//!   the root [`Reference`]
//! - [`Joiner`]: random-access and streaming reads of the content under a
//!   root reference through a [`Getter`](nectar_storage::Getter)
//! - [`LoadSave`]: whole-buffer save and load over a single store
//!
//! ```
//! use nectar_file::{LoadSave, Reference};
//! use nectar_storage::{MemoryStore, ModePut};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let loadsave = LoadSave::new(MemoryStore::new(), ModePut::Upload, true);
//! let reference = loadsave.save(b"hello swarm").await.unwrap();
//!
//! // encrypted references carry the decryption key of the root chunk
//! assert_eq!(reference.to_string().len(), 128);
//! assert_eq!(reference.to_string().parse::<Reference>().unwrap(), reference);
//! assert_eq!(loadsave.load(&reference).await.unwrap(), b"hello swarm".as_slice());
//! # });
//! ```

mod addresses;
pub mod config;
pub mod encryption;
mod error;
mod joiner;
mod loadsave;
pub mod pipeline;
pub mod reference;

pub use addresses::AddressesGetter;
pub use config::{PipelineConfig, ReadAheadConfig};
pub use error::{FileError, Result};
pub use joiner::Joiner;
pub use loadsave::LoadSave;
pub use pipeline::{Pipeline, PipelineBuilder, feed};
pub use reference::{Reference, SpannedReference};
