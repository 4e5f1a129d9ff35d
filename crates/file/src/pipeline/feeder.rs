//! Cuts an arbitrary byte stream into chunk-sized pieces.

use nectar_primitives::{MAX_CHUNK_SIZE, SPAN_SIZE};

use super::PipeWriteArgs;

/// Buffers written bytes into pieces of exactly [`MAX_CHUNK_SIZE`] bytes.
///
/// Only the final piece, taken with [`finish`](Self::finish), may be shorter.
#[derive(Debug)]
pub(crate) struct ChunkFeeder {
    buffer: Vec<u8>,
    total: u64,
    pieces: u64,
}

impl ChunkFeeder {
    pub(crate) fn new() -> Self {
        Self { buffer: Vec::with_capacity(MAX_CHUNK_SIZE), total: 0, pieces: 0 }
    }

    /// Bytes accepted so far
    pub(crate) const fn total(&self) -> u64 {
        self.total
    }

    /// Accept bytes from the front of `data` until a piece is complete.
    ///
    /// Returns the number of bytes taken and the completed piece, if any.
    /// Callers loop until all of their data is taken.
    pub(crate) fn push(&mut self, data: &[u8]) -> (usize, Option<PipeWriteArgs>) {
        let take = (MAX_CHUNK_SIZE - self.buffer.len()).min(data.len());
        self.buffer.extend_from_slice(&data[..take]);
        self.total += take as u64;
        let piece = (self.buffer.len() == MAX_CHUNK_SIZE).then(|| self.piece());
        (take, piece)
    }

    /// Take the buffered remainder as the final piece.
    ///
    /// An empty stream yields one empty piece so that it still has a root.
    pub(crate) fn finish(&mut self) -> Option<PipeWriteArgs> {
        (!self.buffer.is_empty() || self.pieces == 0).then(|| self.piece())
    }

    fn piece(&mut self) -> PipeWriteArgs {
        let span = self.buffer.len() as u64;
        let mut data = Vec::with_capacity(SPAN_SIZE + self.buffer.len());
        data.extend_from_slice(&span.to_le_bytes());
        data.append(&mut self.buffer);
        self.pieces += 1;
        PipeWriteArgs::new(span, data)
    }
}
