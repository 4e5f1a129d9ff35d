//! Reassembles content from its chunk tree.
//!
//! The joiner fetches the root chunk on [`open`](Joiner::open), so the
//! content length is known before any data is read. Reads descend only into
//! the subtrees that overlap the requested range and fetch sibling chunks
//! concurrently, with at most [`ReadAheadConfig::windows`] chunk requests in
//! flight at a time.

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt, TryStreamExt, stream};
use nectar_primitives::{ContentChunk, MAX_CHUNK_SIZE, SPAN_SIZE};
use nectar_storage::{Getter, ModeGet};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::ReadAheadConfig;
use crate::encryption::decrypt_chunk;
use crate::reference::Reference;
use crate::{FileError, Result};

const CHUNK_SIZE: u64 = MAX_CHUNK_SIZE as u64;

/// A decoded chunk: its span and its plaintext payload.
#[derive(Debug, Clone)]
struct Node {
    span: u64,
    payload: Bytes,
}

impl Node {
    const fn is_leaf(&self) -> bool {
        self.span <= CHUNK_SIZE
    }
}

/// Random-access reader over stored content.
#[derive(Debug)]
pub struct Joiner<G> {
    getter: G,
    root: Reference,
    node: Node,
    ref_size: usize,
    mode: ModeGet,
    limit: usize,
    fetches: Semaphore,
    cancel: CancellationToken,
}

impl<G: Getter> Joiner<G> {
    /// Open the content under `root`, fetching the root chunk.
    pub async fn open(getter: G, root: &Reference) -> Result<Self> {
        Self::open_with_mode(getter, root, ModeGet::Request).await
    }

    /// Open the content under `root`, fetching chunks with `mode`.
    pub async fn open_with_mode(getter: G, root: &Reference, mode: ModeGet) -> Result<Self> {
        let mut joiner = Self {
            getter,
            root: *root,
            node: Node { span: 0, payload: Bytes::new() },
            ref_size: root.len(),
            mode,
            limit: 1,
            fetches: Semaphore::new(1),
            cancel: CancellationToken::new(),
        };
        joiner.node = joiner.fetch(root).await?;
        Ok(joiner.with_read_ahead(ReadAheadConfig::default()))
    }

    /// Use `config` to bound the chunk requests in flight and to size the
    /// look-ahead of [`stream`](Self::stream).
    #[must_use]
    pub fn with_read_ahead(mut self, config: ReadAheadConfig) -> Self {
        self.limit = config.windows(self.size());
        self.fetches = Semaphore::new(self.limit);
        self
    }

    /// Abort reads once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Total content length
    pub const fn size(&self) -> u64 {
        self.node.span
    }

    /// Root reference
    pub const fn root(&self) -> &Reference {
        &self.root
    }

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// The result is shorter than `len` only at the end of the content.
    pub async fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let size = self.size();
        if offset > size {
            return Err(FileError::OutOfRange { offset, size });
        }
        let end = offset.saturating_add(len as u64).min(size);
        if end == offset {
            return Ok(Bytes::new());
        }
        self.read_node(self.node.clone(), offset, end).await
    }

    /// Read the whole content.
    pub async fn read_all(&self) -> Result<Bytes> {
        let len = usize::try_from(self.size())
            .map_err(|_| FileError::corrupt("content does not fit in memory"))?;
        self.read_at(0, len).await
    }

    /// Stream the content one chunk window at a time, keeping a number of
    /// windows in flight that depends on the content length.
    pub fn stream(&self) -> impl Stream<Item = Result<Bytes>> + '_ {
        let windows = self.size().div_ceil(CHUNK_SIZE);
        stream::iter(0..windows)
            .map(move |window| self.read_at(window * CHUNK_SIZE, MAX_CHUNK_SIZE))
            .buffered(self.limit)
    }

    /// Copy the whole content into `writer`, returning the bytes written.
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0;
        let mut windows = std::pin::pin!(self.stream());
        while let Some(window) = windows.next().await {
            let window = window?;
            writer.write_all(&window).await?;
            written += window.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Bytes `start..end` of the subtree under `node`, relative to its start.
    fn read_node(&self, node: Node, start: u64, end: u64) -> BoxFuture<'_, Result<Bytes>> {
        async move {
            if node.is_leaf() {
                return Ok(node.payload.slice(start as usize..end as usize));
            }

            let refs = node.payload.len() / self.ref_size;
            let sizes = child_sizes(node.span, refs, self.branching())?;

            let mut reads = Vec::new();
            let mut child_start = 0;
            for (raw, size) in node.payload.chunks(self.ref_size).zip(sizes) {
                let child_end = child_start + size;
                if child_start < end && start < child_end {
                    let reference = Reference::from_slice(raw)?;
                    let (from, to) = (start.max(child_start) - child_start, end.min(child_end) - child_start);
                    reads.push(async move {
                        let child = self.fetch(&reference).await?;
                        if child.span != size {
                            return Err(FileError::corrupt(format!(
                                "child {} spans {} bytes, expected {size}",
                                reference.address(),
                                child.span
                            )));
                        }
                        self.read_node(child, from, to).await
                    });
                }
                child_start = child_end;
            }

            let parts: Vec<Bytes> = stream::iter(reads).buffered(self.limit).try_collect().await?;
            if let [single] = parts.as_slice() {
                return Ok(single.clone());
            }
            let mut out = BytesMut::with_capacity((end - start) as usize);
            for part in parts {
                out.extend_from_slice(&part);
            }
            Ok(out.freeze())
        }
        .boxed()
    }

    /// Fetch, verify and decode one chunk.
    async fn fetch(&self, reference: &Reference) -> Result<Node> {
        if self.cancel.is_cancelled() {
            return Err(FileError::Cancelled);
        }
        let address = reference.address();
        let chunk = {
            let _permit = self.fetches.acquire().await.map_err(|_| FileError::Cancelled)?;
            self.getter.get(self.mode, address).await?
        };
        if !ContentChunk::is_valid(address, chunk.data()) {
            return Err(FileError::InvalidChunk(*address));
        }
        trace!(%address, "fetched chunk");

        let node = match reference.key() {
            Some(key) => {
                let len = chunk.data().len();
                if len != SPAN_SIZE + MAX_CHUNK_SIZE {
                    return Err(FileError::corrupt(format!(
                        "encrypted chunk {address} is {len} bytes, expected a padded chunk"
                    )));
                }
                let (span, payload) = decrypt_chunk(chunk.data(), key)?;
                Node { span, payload }
            }
            None => Node {
                span: chunk.span().ok_or_else(|| FileError::corrupt("chunk shorter than span"))?,
                payload: chunk.data().slice(SPAN_SIZE..),
            },
        };
        self.check(&node)?;
        Ok(node)
    }

    fn check(&self, node: &Node) -> Result<()> {
        let len = node.payload.len();
        if node.is_leaf() {
            if len as u64 != node.span {
                return Err(FileError::corrupt(format!(
                    "leaf payload of {len} bytes with span {}",
                    node.span
                )));
            }
        } else if len == 0 || len % self.ref_size != 0 || len / self.ref_size > self.branching() {
            return Err(FileError::corrupt(format!(
                "reference array of {len} bytes with span {}",
                node.span
            )));
        }
        Ok(())
    }

    const fn branching(&self) -> usize {
        MAX_CHUNK_SIZE / self.ref_size
    }
}

/// Sizes of the subtrees under an intermediate chunk.
///
/// All children but the last are full subtrees of `4096 * branching^k`
/// bytes for the smallest `k` that leaves the last child no larger than the
/// others.
fn child_sizes(span: u64, refs: usize, branching: usize) -> Result<Vec<u64>> {
    let overflow = || FileError::corrupt(format!("span {span} does not fit {refs} references"));
    let head = refs.checked_sub(1).ok_or_else(overflow)? as u64;

    let mut size = CHUNK_SIZE;
    loop {
        let full = head.checked_mul(size).ok_or_else(overflow)?;
        if span <= full {
            return Err(overflow());
        }
        if span - full <= size {
            let mut sizes = vec![size; head as usize];
            sizes.push(span - full);
            return Ok(sizes);
        }
        size = size.checked_mul(branching as u64).ok_or_else(overflow)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pipeline;
    use nectar_primitives::{Chunk, SwarmAddress};
    use nectar_storage::{MemoryStore, ModePut, Putter, StoredChunk};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn content(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn store(store: &MemoryStore, data: &[u8], encrypt: bool) -> Reference {
        let mut pipeline = Pipeline::new(store, ModePut::Upload, encrypt);
        pipeline.write(data).await.unwrap();
        pipeline.sum().await.unwrap()
    }

    #[test]
    fn test_child_sizes() {
        let c = CHUNK_SIZE;
        assert_eq!(child_sizes(c + 1, 2, 128).unwrap(), vec![c, 1]);
        assert_eq!(child_sizes(c * 128 + 1, 2, 128).unwrap(), vec![c * 128, 1]);
        assert_eq!(child_sizes(c * 128, 128, 128).unwrap(), vec![c; 128]);
        assert_eq!(
            child_sizes(c * 128 * 128 + c * 128 + 1, 2, 128).unwrap(),
            vec![c * 128 * 128, c * 128 + 1]
        );
        assert_eq!(child_sizes(c * 64 + 1, 2, 64).unwrap(), vec![c * 64, 1]);
        assert_eq!(child_sizes(c * 64 * 64 + 1, 2, 64).unwrap(), vec![c * 64 * 64, 1]);
        assert_eq!(
            child_sizes(c * 64 * 64 * 2 + 5, 3, 64).unwrap(),
            vec![c * 64 * 64, c * 64 * 64, 5]
        );
    }

    #[test]
    fn test_child_sizes_rejects_inconsistent_spans() {
        assert!(child_sizes(CHUNK_SIZE + 1, 3, 128).is_err());
        assert!(child_sizes(100, 0, 128).is_err());
        assert!(child_sizes(u64::MAX, 127, 128).is_err());
    }

    #[tokio::test]
    async fn test_roundtrip_around_boundaries() {
        let c = MAX_CHUNK_SIZE;
        for encrypt in [false, true] {
            for len in [0, 1, c - 1, c, c + 1, c * 2, c * 64 - 1, c * 64, c * 64 + 1, c * 128, c * 128 + 1]
            {
                let memory = MemoryStore::new();
                let data = content(len);
                let root = store(&memory, &data, encrypt).await;

                let joiner = Joiner::open(&memory, &root).await.unwrap();
                assert_eq!(joiner.size(), len as u64, "len {len} encrypt {encrypt}");
                assert_eq!(joiner.read_all().await.unwrap(), data, "len {len} encrypt {encrypt}");
            }
        }
    }

    #[tokio::test]
    async fn test_range_reads() {
        let memory = MemoryStore::new();
        let data = content(MAX_CHUNK_SIZE * 130 + 123);
        let root = store(&memory, &data, false).await;
        let joiner = Joiner::open(&memory, &root).await.unwrap();

        for (offset, len) in [(0, 10), (4090, 20), (4096 * 128 - 5, 10), (data.len() - 3, 100), (1, 9000)] {
            let end = (offset + len).min(data.len());
            let read = joiner.read_at(offset as u64, len).await.unwrap();
            assert_eq!(read, &data[offset..end], "offset {offset} len {len}");
        }
        assert!(joiner.read_at(data.len() as u64, 10).await.unwrap().is_empty());
        assert!(matches!(
            joiner.read_at(data.len() as u64 + 1, 1).await,
            Err(FileError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_roundtrip_three_level_trees() {
        let c = MAX_CHUNK_SIZE;
        let cases = [(c * 64 * 64 + 1, true), (c * 64 * 64 + c * 64 + 1, true), (c * 128 * 128 + 1, false)];
        for (len, encrypt) in cases {
            let memory = MemoryStore::new();
            let data = content(len);
            let root = store(&memory, &data, encrypt).await;
            let joiner = Joiner::open(&memory, &root).await.unwrap();

            assert_eq!(joiner.size(), len as u64);
            assert_eq!(joiner.read_all().await.unwrap(), data, "len {len} encrypt {encrypt}");
            let branch = c * (MAX_CHUNK_SIZE / root.len());
            for offset in [branch - 3, len - c - 2, len - 1] {
                let read = joiner.read_at(offset as u64, c).await.unwrap();
                assert_eq!(read, &data[offset..(offset + c).min(len)], "len {len} offset {offset}");
            }
        }
    }

    /// Tracks how many gets run at once.
    #[derive(Debug)]
    struct Counting<'a> {
        inner: &'a MemoryStore,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl<'a> Counting<'a> {
        fn new(inner: &'a MemoryStore) -> Self {
            Self { inner, current: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
        }
    }

    impl Getter for Counting<'_> {
        async fn get(
            &self,
            mode: ModeGet,
            address: &SwarmAddress,
        ) -> nectar_storage::Result<StoredChunk> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let chunk = self.inner.get(mode, address).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            chunk
        }
    }

    #[tokio::test]
    async fn test_concurrent_gets_are_bounded() {
        let memory = MemoryStore::new();
        let data = content(MAX_CHUNK_SIZE * 2000);
        let root = store(&memory, &data, false).await;

        let counting = Counting::new(&memory);
        let joiner = Joiner::open(&counting, &root).await.unwrap();
        assert_eq!(joiner.read_all().await.unwrap(), data);
        let peak = counting.peak.load(Ordering::SeqCst);
        assert!(peak > 1 && peak <= ReadAheadConfig::default().windows(data.len() as u64), "peak {peak}");

        let counting = Counting::new(&memory);
        let joiner = Joiner::open(&counting, &root)
            .await
            .unwrap()
            .with_read_ahead(ReadAheadConfig::default().with_small_buffer(MAX_CHUNK_SIZE * 4));
        assert_eq!(joiner.read_all().await.unwrap(), data);
        let streamed: Vec<Bytes> = joiner.stream().map(|w| w.unwrap()).collect().await;
        assert_eq!(streamed.concat(), data);
        assert!(counting.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_encrypted_reference_to_unpadded_chunk_is_corrupt() {
        let memory = MemoryStore::new();
        let plain = ContentChunk::new(vec![7u8; 100]).unwrap();
        memory.put(ModePut::Upload, &[StoredChunk::from(&plain)]).await.unwrap();

        let reference = Reference::encrypted(*plain.address(), crate::encryption::generate_key());
        assert!(matches!(
            Joiner::open(&memory, &reference).await,
            Err(FileError::CorruptTree(_))
        ));
    }

    #[tokio::test]
    async fn test_range_read_fetches_only_overlapping_chunks() {
        let memory = MemoryStore::new();
        let data = content(MAX_CHUNK_SIZE * 10);
        let root = store(&memory, &data, false).await;
        let joiner = Joiner::open(&memory, &root).await.unwrap();

        let before = memory.reads();
        joiner.read_at(4096 * 3 + 10, 100).await.unwrap();
        assert_eq!(memory.reads() - before, 1);
    }

    #[tokio::test]
    async fn test_stream_and_write_to() {
        let memory = MemoryStore::new();
        let data = content(MAX_CHUNK_SIZE * 5 + 99);
        let root = store(&memory, &data, true).await;
        let joiner = Joiner::open(&memory, &root)
            .await
            .unwrap()
            .with_read_ahead(ReadAheadConfig::default().with_small_buffer(8192));

        let windows: Vec<Bytes> = joiner.stream().map(|w| w.unwrap()).collect().await;
        assert_eq!(windows.len(), 6);
        assert_eq!(windows.concat(), data);

        let mut out = Vec::new();
        assert_eq!(joiner.write_to(&mut out).await.unwrap(), data.len() as u64);
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_missing_chunk_is_not_found() {
        let memory = MemoryStore::new();
        let data = content(MAX_CHUNK_SIZE * 3);
        let root = store(&memory, &data, false).await;
        let joiner = Joiner::open(&memory, &root).await.unwrap();

        let payload = memory.chunk(root.address()).unwrap().payload().to_vec();
        let second = Reference::from_slice(&payload[32..64]).unwrap();
        memory.remove(second.address());

        match joiner.read_all().await {
            Err(FileError::NotFound(address)) => assert_eq!(&address, second.address()),
            other => panic!("expected not found, got {other:?}"),
        }
        assert!(joiner.read_at(0, 100).await.is_ok());
    }

    #[tokio::test]
    async fn test_tampered_leaf_is_detected() {
        for encrypt in [false, true] {
            let memory = MemoryStore::new();
            let data = content(MAX_CHUNK_SIZE * 2 + 5);
            let root = store(&memory, &data, encrypt).await;

            let leaf = {
                let chunk = memory.chunk(root.address()).unwrap();
                let (_, payload) = match root.key() {
                    Some(key) => decrypt_chunk(chunk.data(), key).unwrap(),
                    None => (0, chunk.data().slice(SPAN_SIZE..)),
                };
                Reference::from_slice(&payload[..root.len()]).unwrap()
            };
            let stored = memory.chunk(leaf.address()).unwrap();
            let mut tampered = stored.data().to_vec();
            tampered[SPAN_SIZE + 10] ^= 0xff;
            let tampered = StoredChunk::new(*leaf.address(), tampered);
            assert!(!tampered.is_valid_content());
            memory.overwrite(tampered);

            let joiner = Joiner::open(&memory, &root).await.unwrap();
            match joiner.read_all().await {
                Err(FileError::InvalidChunk(address)) => assert_eq!(&address, leaf.address()),
                other => panic!("expected invalid chunk, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_malformed_intermediate_is_corrupt() {
        let memory = MemoryStore::new();
        let leaf = ContentChunk::new(vec![1u8; 10]).unwrap();
        memory.put(ModePut::Upload, &[StoredChunk::from(&leaf)]).await.unwrap();

        // span claims two chunks of content but only one reference follows
        let mut data = (CHUNK_SIZE * 2).to_le_bytes().to_vec();
        data.extend_from_slice(leaf.address().as_bytes());
        let root = ContentChunk::try_from(data.as_slice()).unwrap();
        memory.put(ModePut::Upload, &[StoredChunk::from(&root)]).await.unwrap();

        let joiner = Joiner::open(&memory, &Reference::new(*root.address())).await.unwrap();
        assert!(matches!(joiner.read_all().await, Err(FileError::CorruptTree(_))));

        // a reference array that is not a multiple of the reference size
        let mut data = (CHUNK_SIZE * 2).to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 40]);
        let root = ContentChunk::try_from(data.as_slice()).unwrap();
        memory.put(ModePut::Upload, &[StoredChunk::from(&root)]).await.unwrap();
        assert!(matches!(
            Joiner::open(&memory, &Reference::new(*root.address())).await,
            Err(FileError::CorruptTree(_))
        ));
    }

    #[tokio::test]
    async fn test_leaf_span_mismatch_is_corrupt() {
        let memory = MemoryStore::new();
        let mut data = 20u64.to_le_bytes().to_vec();
        data.extend_from_slice(&[5u8; 10]);
        let chunk = ContentChunk::try_from(data.as_slice()).unwrap();
        memory.put(ModePut::Upload, &[StoredChunk::from(&chunk)]).await.unwrap();

        let result = Joiner::open(&memory, &Reference::new(*chunk.address())).await;
        assert!(matches!(result, Err(FileError::CorruptTree(_))));
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let memory = MemoryStore::new();
        let root = store(&memory, &content(MAX_CHUNK_SIZE * 4), false).await;
        let token = CancellationToken::new();
        let joiner = Joiner::open(&memory, &root).await.unwrap().with_cancellation(token.clone());

        token.cancel();
        assert!(matches!(joiner.read_all().await, Err(FileError::Cancelled)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn proptest_roundtrip(len in 0usize..(MAX_CHUNK_SIZE * 70), encrypt in any::<bool>()) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let data = content(len);
            let read = runtime.block_on(async {
                let memory = MemoryStore::new();
                let root = store(&memory, &data, encrypt).await;
                Joiner::open(&memory, &root).await.unwrap().read_all().await.unwrap()
            });
            prop_assert_eq!(read, data);
        }
    }
}
