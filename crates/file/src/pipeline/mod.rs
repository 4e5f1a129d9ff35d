//! The write pipeline: splits content into chunks, stores them and returns
//! the root reference of the resulting tree.
//!
//! Each piece of input goes through an ordered chain of stages:
//!
//! 1. the feeder cuts the stream into pieces of at most one chunk,
//! 2. the optional encryptor replaces the piece with its ciphertext,
//! 3. the BMT writer computes the chunk address,
//! 4. the store writer persists the chunk and returns its reference,
//!
//! after which the pipeline hands the reference to the [`HashTrieWriter`].
//! Intermediate chunks of the tree go through a fresh [`ShortPipeline`]
//! without feeder or tree.
//!
//! ```
//! use nectar_file::{Joiner, Pipeline};
//! use nectar_storage::{MemoryStore, ModePut};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let mut pipeline = Pipeline::new(&store, ModePut::Upload, false);
//! pipeline.write(&[42u8; 10_000]).await.unwrap();
//! let root = pipeline.sum().await.unwrap();
//!
//! let joiner = Joiner::open(&store, &root).await.unwrap();
//! assert_eq!(joiner.size(), 10_000);
//! # });
//! ```

mod bmt;
mod encryption;
mod feeder;
mod hashtrie;
mod store;

use std::fmt;

use nectar_primitives::{HasherPool, MAX_CHUNK_SIZE, SwarmAddress};
use nectar_storage::{ModePut, Putter};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use hashtrie::HashTrieWriter;

use self::bmt::BmtWriter;
use self::encryption::EncryptionWriter;
use self::feeder::ChunkFeeder;
use self::store::StoreWriter;
use crate::config::PipelineConfig;
use crate::reference::{
    ENCRYPTED_REFERENCE_SIZE, EncryptionKey, REFERENCE_SIZE, Reference, SpannedReference,
};
use crate::{FileError, Result};

/// A piece travelling through the stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeWriteArgs {
    /// Plaintext span of the piece
    pub span: u64,
    /// Chunk data, `span ++ payload`; encrypted once past the encryptor
    pub data: Vec<u8>,
    /// Chunk address, set by the hasher
    pub address: Option<SwarmAddress>,
    /// Encryption key, set by the encryptor
    pub key: Option<EncryptionKey>,
}

impl PipeWriteArgs {
    /// A fresh piece with no address or key yet.
    pub const fn new(span: u64, data: Vec<u8>) -> Self {
        Self { span, data, address: None, key: None }
    }
}

/// A synchronous transform stage.
pub trait ChainWriter: Send + fmt::Debug {
    /// Transform the piece in place.
    fn chain_write(&mut self, args: &mut PipeWriteArgs) -> Result<()>;
}

/// Transform stages followed by a store writer.
#[derive(Debug)]
pub struct ShortPipeline<P> {
    stages: Vec<Box<dyn ChainWriter>>,
    store: StoreWriter<P>,
}

impl<P: Putter> ShortPipeline<P> {
    /// Run the piece through every stage, store it and return its reference.
    pub async fn write(&mut self, args: &mut PipeWriteArgs) -> Result<SpannedReference> {
        for stage in &mut self.stages {
            stage.chain_write(args)?;
        }
        self.store.write(args).await
    }
}

/// Creates short pipelines sharing one putter, mode and hasher pool.
#[derive(Debug, Clone)]
pub struct ShortPipelineFactory<P> {
    putter: P,
    mode: ModePut,
    encrypt: bool,
    pool: HasherPool,
}

impl<P: Putter + Clone> ShortPipelineFactory<P> {
    /// Factory for pipelines storing through `putter`.
    pub const fn new(putter: P, mode: ModePut, encrypt: bool, pool: HasherPool) -> Self {
        Self { putter, mode, encrypt, pool }
    }

    /// A fresh stage chain: [encryptor] then hasher then store writer.
    pub fn create(&self) -> ShortPipeline<P> {
        let mut stages: Vec<Box<dyn ChainWriter>> = Vec::with_capacity(2);
        if self.encrypt {
            stages.push(Box::new(EncryptionWriter));
        }
        stages.push(Box::new(BmtWriter::new(self.pool.clone())));
        ShortPipeline { stages, store: StoreWriter::new(self.putter.clone(), self.mode) }
    }

    /// Serialized size of the references produced
    pub const fn reference_size(&self) -> usize {
        if self.encrypt { ENCRYPTED_REFERENCE_SIZE } else { REFERENCE_SIZE }
    }

    /// References per intermediate chunk
    pub const fn branching(&self) -> usize {
        MAX_CHUNK_SIZE / self.reference_size()
    }
}

/// A write pipeline for one piece of content.
///
/// Write the content with [`write`](Self::write), in calls of any size, then
/// call [`sum`](Self::sum) for the root reference. The resulting tree is
/// independent of how the content was split across calls.
pub struct Pipeline<P> {
    feeder: ChunkFeeder,
    chain: ShortPipeline<P>,
    trie: HashTrieWriter<P>,
    cancel: CancellationToken,
}

impl<P> fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("written", &self.feeder.total())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<P: Putter + Clone> Pipeline<P> {
    /// Pipeline storing through `putter` with `mode`, encrypting if asked.
    pub fn new(putter: P, mode: ModePut, encrypt: bool) -> Self {
        PipelineBuilder::new(putter).mode(mode).encrypt(encrypt).build()
    }

    /// Start configuring a pipeline.
    pub fn builder(putter: P) -> PipelineBuilder<P> {
        PipelineBuilder::new(putter)
    }

    /// Content bytes accepted so far
    pub const fn written(&self) -> u64 {
        self.feeder.total()
    }

    /// Accept content, storing every chunk it completes as soon as it is
    /// complete.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check_cancelled()?;
        let mut rest = data;
        while !rest.is_empty() {
            let (taken, piece) = self.feeder.push(rest);
            rest = &rest[taken..];
            if let Some(mut piece) = piece {
                self.check_cancelled()?;
                self.process(&mut piece).await?;
            }
        }
        Ok(data.len())
    }

    /// Store the remaining content and return the root reference.
    pub async fn sum(mut self) -> Result<Reference> {
        self.check_cancelled()?;
        if let Some(mut piece) = self.feeder.finish() {
            self.process(&mut piece).await?;
        }
        self.check_cancelled()?;

        let root = self.trie.sum().await?;
        debug!(%root, size = self.feeder.total(), "content stored");
        Ok(root)
    }

    async fn process(&mut self, piece: &mut PipeWriteArgs) -> Result<()> {
        let reference = self.chain.write(piece).await?;
        self.trie.append(reference).await
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(FileError::Cancelled);
        }
        Ok(())
    }
}

/// Configures a [`Pipeline`].
#[derive(Debug)]
pub struct PipelineBuilder<P> {
    putter: P,
    config: PipelineConfig,
    pool: Option<HasherPool>,
    cancel: Option<CancellationToken>,
}

impl<P: Putter + Clone> PipelineBuilder<P> {
    /// Builder storing through `putter` with default options.
    pub fn new(putter: P) -> Self {
        Self { putter, config: PipelineConfig::default(), pool: None, cancel: None }
    }

    /// Replace all options.
    #[must_use]
    pub const fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Mode chunks are stored with.
    #[must_use]
    pub const fn mode(mut self, mode: ModePut) -> Self {
        self.config.mode = mode;
        self
    }

    /// Whether to encrypt chunks.
    #[must_use]
    pub const fn encrypt(mut self, encrypt: bool) -> Self {
        self.config.encrypt = encrypt;
        self
    }

    /// Share an existing hasher pool instead of creating one.
    #[must_use]
    pub fn hasher_pool(mut self, pool: HasherPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Abort writes once `token` is cancelled.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Pipeline<P> {
        let PipelineConfig { mode, encrypt, pool_capacity } = self.config;
        let pool = self.pool.unwrap_or_else(|| HasherPool::new(pool_capacity));
        let factory = ShortPipelineFactory::new(self.putter, mode, encrypt, pool);
        Pipeline {
            feeder: ChunkFeeder::new(),
            chain: factory.create(),
            trie: HashTrieWriter::new(factory),
            cancel: self.cancel.unwrap_or_default(),
        }
    }
}

/// Write everything `reader` yields through `pipeline` and return the root.
pub async fn feed<P, R>(mut pipeline: Pipeline<P>, mut reader: R) -> Result<Reference>
where
    P: Putter + Clone,
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; MAX_CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        let written = pipeline.write(&buf[..read]).await?;
        if written != read {
            return Err(FileError::ShortWrite { written, expected: read });
        }
    }
    pipeline.sum().await
}

#[cfg(test)]
mod tests;
