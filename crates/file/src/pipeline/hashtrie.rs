//! Assembles chunk references into a tree.
//!
//! References arrive at level 0 in content order. A level that fills up to
//! the branching factor is packed into an intermediate chunk whose reference
//! moves one level up, so the shape of the tree depends only on the content
//! length. At the end, partial levels are packed bottom-up until a single
//! root reference is left.

use bytes::BufMut;
use nectar_primitives::SPAN_SIZE;
use nectar_storage::Putter;
use tracing::trace;

use super::{PipeWriteArgs, ShortPipelineFactory};
use crate::reference::{Reference, SpannedReference};
use crate::{FileError, Result};

/// Per-level reference buffers of a tree under construction.
#[derive(Debug)]
pub struct HashTrieWriter<P> {
    levels: Vec<Vec<SpannedReference>>,
    factory: ShortPipelineFactory<P>,
    branching: usize,
    ref_size: usize,
}

impl<P: Putter + Clone> HashTrieWriter<P> {
    /// Empty tree writing intermediate chunks through pipelines from
    /// `factory`.
    pub fn new(factory: ShortPipelineFactory<P>) -> Self {
        Self {
            levels: vec![Vec::new()],
            branching: factory.branching(),
            ref_size: factory.reference_size(),
            factory,
        }
    }

    /// Number of levels holding references
    pub fn depth(&self) -> usize {
        self.levels.iter().rposition(|level| !level.is_empty()).map_or(0, |top| top + 1)
    }

    /// Add a leaf reference.
    pub async fn append(&mut self, reference: SpannedReference) -> Result<()> {
        let mut reference = reference;
        let mut level = 0;
        loop {
            self.push(level, reference);
            if self.levels[level].len() < self.branching {
                return Ok(());
            }
            reference = self.wrap(level).await?;
            level += 1;
        }
    }

    /// Finish the tree and return the root reference.
    ///
    /// A level with a single reference below a non-empty level is carried up
    /// unchanged rather than wrapped, so every intermediate chunk has at
    /// least two children.
    pub async fn sum(mut self) -> Result<Reference> {
        let mut level = 0;
        loop {
            let top = self
                .levels
                .iter()
                .rposition(|level| !level.is_empty())
                .ok_or_else(|| FileError::corrupt("no references to sum"))?;

            match self.levels[level].len() {
                1 if level == top => return Ok(self.levels[level][0].reference),
                0 => {}
                1 => {
                    let carried = self.levels[level].remove(0);
                    self.push(level + 1, carried);
                }
                _ => {
                    let wrapped = self.wrap(level).await?;
                    self.push(level + 1, wrapped);
                }
            }
            level += 1;
        }
    }

    fn push(&mut self, level: usize, reference: SpannedReference) {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(reference);
    }

    /// Pack all references of `level` into an intermediate chunk.
    async fn wrap(&mut self, level: usize) -> Result<SpannedReference> {
        let refs = std::mem::take(&mut self.levels[level]);
        let span = refs
            .iter()
            .try_fold(0u64, |span, r| span.checked_add(r.span))
            .ok_or_else(|| FileError::corrupt("span overflow"))?;

        let mut data = Vec::with_capacity(SPAN_SIZE + refs.len() * self.ref_size);
        data.put_u64_le(span);
        for r in &refs {
            r.reference.put_into(&mut data);
        }

        let mut args = PipeWriteArgs::new(span, data);
        let reference = self.factory.create().write(&mut args).await?;
        trace!(level, children = refs.len(), span, address = %reference.reference.address(), "wrapped level");
        Ok(reference)
    }
}
