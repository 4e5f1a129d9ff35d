//! Persists hashed pieces.

use std::mem;

use nectar_storage::{ModePut, Putter, StoredChunk};
use tracing::trace;

use super::PipeWriteArgs;
use crate::reference::{Reference, SpannedReference};
use crate::{FileError, Result};

/// Writes hashed pieces to a [`Putter`] and emits their references.
#[derive(Debug, Clone)]
pub(crate) struct StoreWriter<P> {
    putter: P,
    mode: ModePut,
}

impl<P: Putter> StoreWriter<P> {
    pub(crate) const fn new(putter: P, mode: ModePut) -> Self {
        Self { putter, mode }
    }

    /// Store the piece and return its reference.
    ///
    /// The piece must already carry an address.
    pub(crate) async fn write(&self, args: &mut PipeWriteArgs) -> Result<SpannedReference> {
        let address = args.address.ok_or_else(|| FileError::corrupt("piece stored before hashing"))?;
        let chunk = StoredChunk::new(address, mem::take(&mut args.data));
        let existed = self.putter.put(self.mode, &[chunk]).await?;
        trace!(%address, span = args.span, existed = existed.first().copied().unwrap_or_default(), "stored chunk");

        let reference = match args.key {
            Some(key) => Reference::encrypted(address, key),
            None => Reference::new(address),
        };
        Ok(SpannedReference::new(reference, args.span))
    }
}
