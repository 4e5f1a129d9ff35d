//! Encrypts pieces before they are hashed.

use tracing::trace;

use super::{ChainWriter, PipeWriteArgs};
use crate::Result;
use crate::encryption::encrypt_chunk;

/// Replaces a piece's data with its encryption under a fresh key.
///
/// The plaintext span stays in [`PipeWriteArgs::span`] for tree assembly.
#[derive(Debug, Default)]
pub(crate) struct EncryptionWriter;

impl ChainWriter for EncryptionWriter {
    fn chain_write(&mut self, args: &mut PipeWriteArgs) -> Result<()> {
        let (key, data) = encrypt_chunk(&args.data)?;
        trace!(span = args.span, "encrypted piece");
        args.data = data.into();
        args.key = Some(key);
        Ok(())
    }
}
