//! Computes chunk addresses.

use nectar_primitives::{HasherPool, SPAN_SIZE, SwarmAddress};

use super::{ChainWriter, PipeWriteArgs};
use crate::{FileError, Result};

/// Hashes `span ++ payload` with a pooled BMT hasher and records the address.
///
/// The span header is hashed as stored, so for encrypted pieces it is the
/// encrypted span.
#[derive(Debug, Clone)]
pub(crate) struct BmtWriter {
    pool: HasherPool,
}

impl BmtWriter {
    pub(crate) const fn new(pool: HasherPool) -> Self {
        Self { pool }
    }
}

impl ChainWriter for BmtWriter {
    fn chain_write(&mut self, args: &mut PipeWriteArgs) -> Result<()> {
        let header: [u8; SPAN_SIZE] = args
            .data
            .get(..SPAN_SIZE)
            .and_then(|header| header.try_into().ok())
            .ok_or(FileError::ShortWrite { written: args.data.len(), expected: SPAN_SIZE })?;

        let mut hasher = self.pool.acquire();
        hasher.set_span(u64::from_le_bytes(header));
        hasher.write_exact(&args.data[SPAN_SIZE..])?;
        args.address = Some(SwarmAddress::from(hasher.sum()));
        Ok(())
    }
}
