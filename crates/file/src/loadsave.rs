//! Whole-content save and load over one store.

use bytes::Bytes;
use nectar_primitives::HasherPool;
use nectar_storage::{Getter, ModeGet, ModePut, Putter};

use crate::config::PipelineConfig;
use crate::reference::Reference;
use crate::{Joiner, PipelineBuilder, Result};

/// Saves byte slices as chunk trees and loads them back.
///
/// Meant for small, fully buffered content such as manifests and metadata.
#[derive(Debug, Clone)]
pub struct LoadSave<S> {
    store: S,
    config: PipelineConfig,
    get_mode: ModeGet,
    pool: HasherPool,
}

impl<S> LoadSave<S>
where
    S: Getter + Putter,
{
    /// Save and load through `store`, writing with `mode`.
    pub fn new(store: S, mode: ModePut, encrypt: bool) -> Self {
        Self::with_config(store, PipelineConfig::default().with_mode(mode).with_encrypt(encrypt))
    }

    /// Save and load through `store` with explicit pipeline options.
    pub fn with_config(store: S, config: PipelineConfig) -> Self {
        Self { store, config, get_mode: ModeGet::Request, pool: HasherPool::new(config.pool_capacity) }
    }

    /// Load with `mode` instead of [`ModeGet::Request`].
    #[must_use]
    pub const fn with_get_mode(mut self, mode: ModeGet) -> Self {
        self.get_mode = mode;
        self
    }

    /// The underlying store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Store `data` and return its root reference.
    pub async fn save(&self, data: &[u8]) -> Result<Reference> {
        let mut pipeline =
            PipelineBuilder::new(&self.store).config(self.config).hasher_pool(self.pool.clone()).build();
        pipeline.write(data).await?;
        pipeline.sum().await
    }

    /// Read back the whole content under `reference`.
    pub async fn load(&self, reference: &Reference) -> Result<Bytes> {
        Joiner::open_with_mode(&self.store, reference, self.get_mode).await?.read_all().await
    }
}
