use super::*;
use crate::encryption::decrypt_chunk;
use nectar_primitives::{Chunk, ContentChunk};
use nectar_storage::{MemoryStore, StorageError, StoredChunk};
use proptest::prelude::*;

const CHUNK: usize = MAX_CHUNK_SIZE;

fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn store_content(store: &MemoryStore, data: &[u8], encrypt: bool) -> Reference {
    let mut pipeline = Pipeline::new(store, ModePut::Upload, encrypt);
    assert_eq!(pipeline.write(data).await.unwrap(), data.len());
    pipeline.sum().await.unwrap()
}

/// Span and payload of a stored chunk, decrypted when the reference has a key.
fn open(store: &MemoryStore, reference: &Reference) -> (u64, Vec<u8>) {
    let chunk = store.chunk(reference.address()).unwrap();
    match reference.key() {
        Some(key) => {
            let (span, payload) = decrypt_chunk(chunk.data(), key).unwrap();
            (span, payload.to_vec())
        }
        None => (chunk.span().unwrap(), chunk.payload().to_vec()),
    }
}

/// Visit every intermediate chunk below `reference`, checking spans on the
/// way. Returns the span and the depth of the subtree.
fn walk(
    store: &MemoryStore,
    reference: &Reference,
    visit: &mut impl FnMut(u64, &[u8]),
) -> (u64, usize) {
    let (span, payload) = open(store, reference);
    if span <= CHUNK as u64 {
        assert_eq!(payload.len() as u64, span);
        return (span, 1);
    }
    visit(span, &payload);

    let mut total = 0;
    let mut depth = 0;
    for child in payload.chunks(reference.len()) {
        let child = Reference::from_slice(child).unwrap();
        let (child_span, child_depth) = walk(store, &child, visit);
        total += child_span;
        depth = depth.max(child_depth);
    }
    assert_eq!(total, span, "intermediate span is the sum of its children");
    (span, depth + 1)
}

fn depth(store: &MemoryStore, root: &Reference) -> usize {
    walk(store, root, &mut |_, _| {}).1
}

#[tokio::test]
async fn test_single_chunk_is_its_own_root() {
    for len in [1, 100, CHUNK] {
        let store = MemoryStore::new();
        let data = content(len);
        let root = store_content(&store, &data, false).await;

        let expected = ContentChunk::new(data).unwrap();
        assert_eq!(root.address(), expected.address());
        assert_eq!(store.len(), 1);
    }
}

#[tokio::test]
async fn test_empty_content_has_empty_root() {
    let store = MemoryStore::new();
    let root = store_content(&store, &[], false).await;

    let chunk = store.chunk(root.address()).unwrap();
    assert_eq!(chunk.span(), Some(0));
    assert!(chunk.payload().is_empty());
    assert!(chunk.is_valid_content());
}

#[tokio::test]
async fn test_branching_boundary_plain() {
    let store = MemoryStore::new();
    let full = store_content(&store, &content(CHUNK * 128), false).await;
    let over = store_content(&store, &content(CHUNK * 128 + 1), false).await;

    assert_eq!(depth(&store, &full), 2);
    assert_eq!(depth(&store, &over), 3);
}

#[tokio::test]
async fn test_branching_boundary_encrypted() {
    let store = MemoryStore::new();
    let full = store_content(&store, &content(CHUNK * 64), true).await;
    let over = store_content(&store, &content(CHUNK * 64 + 1), true).await;

    assert!(full.is_encrypted());
    assert_eq!(depth(&store, &full), 2);
    assert_eq!(depth(&store, &over), 3);
}

#[tokio::test]
async fn test_intermediate_spans_exceed_one_chunk() {
    for len in [CHUNK + 1, CHUNK * 129, CHUNK * 128 * 2 + CHUNK * 3 + 7] {
        let store = MemoryStore::new();
        let root = store_content(&store, &content(len), false).await;

        let mut intermediates = 0;
        let (span, _) = walk(&store, &root, &mut |span, payload| {
            assert!(span > CHUNK as u64);
            assert!(payload.len() >= 2 * REFERENCE_SIZE);
            intermediates += 1;
        });
        assert_eq!(span, len as u64);
        assert!(intermediates > 0);
    }
}

#[tokio::test]
async fn test_lone_reference_is_carried_through_two_levels() {
    let store = MemoryStore::new();
    let len = CHUNK * 64 * 64 + 1;
    let root = store_content(&store, &content(len), true).await;

    let (span, payload) = open(&store, &root);
    assert_eq!(span, len as u64);
    assert_eq!(payload.len(), 2 * ENCRYPTED_REFERENCE_SIZE);

    // the trailing byte hangs directly off the root
    let tail = Reference::from_slice(&payload[ENCRYPTED_REFERENCE_SIZE..]).unwrap();
    assert_eq!(open(&store, &tail), (1, vec![((len - 1) % 251) as u8]));
    assert_eq!(depth(&store, &root), 4);
}

#[tokio::test]
async fn test_spans_of_three_level_trees() {
    let cases = [
        (CHUNK * 64 * 64 + 1, true),
        (CHUNK * 64 * 64 + CHUNK * 64 + 1, true),
        (CHUNK * 128 * 128 + 1, false),
    ];
    for (len, encrypt) in cases {
        let store = MemoryStore::new();
        let root = store_content(&store, &content(len), encrypt).await;
        let branching = MAX_CHUNK_SIZE / root.len();

        let mut intermediates = 0;
        let (span, depth) = walk(&store, &root, &mut |span, payload| {
            assert!(span > CHUNK as u64);
            assert!(payload.len() >= 2 * root.len());
            assert!(payload.len() / root.len() <= branching);
            intermediates += 1;
        });
        assert_eq!(span, len as u64, "len {len} encrypt {encrypt}");
        assert_eq!(depth, 4, "len {len} encrypt {encrypt}");
        assert!(intermediates > branching);
    }
}

#[tokio::test]
async fn test_encrypted_intermediates_hold_at_most_64_references() {
    let store = MemoryStore::new();
    let len = CHUNK * 64 * 2 + CHUNK * 5 + 11;
    let root = store_content(&store, &content(len), true).await;

    let mut intermediates = 0;
    walk(&store, &root, &mut |span, payload| {
        assert!(span > CHUNK as u64);
        assert_eq!(payload.len() % ENCRYPTED_REFERENCE_SIZE, 0);
        assert!(payload.len() / ENCRYPTED_REFERENCE_SIZE <= 64);
        intermediates += 1;
    });
    assert!(intermediates >= 3);

    // every stored chunk is a padded ciphertext
    for address in store.addresses() {
        assert_eq!(store.chunk(&address).unwrap().data().len(), 8 + CHUNK);
    }
}

#[tokio::test]
async fn test_encryption_is_randomized() {
    let store = MemoryStore::new();
    let data = content(CHUNK * 2);
    let a = store_content(&store, &data, true).await;
    let b = store_content(&store, &data, true).await;
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_feed_reads_whole_stream() {
    let store = MemoryStore::new();
    let data = content(CHUNK * 3 + 17);

    let root = feed(Pipeline::new(&store, ModePut::Upload, false), data.as_slice()).await.unwrap();
    assert_eq!(root, store_content(&MemoryStore::new(), &data, false).await);
    assert_eq!(walk(&store, &root, &mut |_, _| {}).0, data.len() as u64);
}

#[tokio::test]
async fn test_mode_is_passed_to_store() {
    let store = MemoryStore::new();
    let mut pipeline = Pipeline::builder(&store).mode(ModePut::UploadPin).build();
    pipeline.write(&content(CHUNK + 1)).await.unwrap();
    let root = pipeline.sum().await.unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.mode_of(root.address()), Some(ModePut::UploadPin));
    assert!(store.is_pinned(root.address()));
}

#[tokio::test]
async fn test_cancelled_pipeline_writes_nothing_more() {
    let store = MemoryStore::new();
    let token = CancellationToken::new();
    let mut pipeline = Pipeline::builder(&store).cancellation(token.clone()).build();

    pipeline.write(&content(CHUNK * 2)).await.unwrap();
    assert_eq!(store.len(), 2);

    token.cancel();
    assert!(matches!(pipeline.write(&content(CHUNK)).await, Err(FileError::Cancelled)));
    assert!(matches!(pipeline.sum().await, Err(FileError::Cancelled)));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_shared_hasher_pool_is_reused() {
    let store = MemoryStore::new();
    let pool = HasherPool::new(4);
    let mut pipeline = Pipeline::builder(&store).hasher_pool(pool.clone()).build();
    pipeline.write(&content(CHUNK * 3)).await.unwrap();
    pipeline.sum().await.unwrap();

    assert_eq!(pool.idle(), 1);
}

#[derive(Debug, Clone)]
struct FailingPutter;

impl Putter for FailingPutter {
    async fn put(&self, _: ModePut, _: &[StoredChunk]) -> nectar_storage::Result<Vec<bool>> {
        Err(StorageError::backend("disk full"))
    }
}

#[tokio::test]
async fn test_store_failure_surfaces() {
    let mut pipeline = Pipeline::new(FailingPutter, ModePut::Upload, false);
    // nothing is stored until a piece completes
    assert_eq!(pipeline.write(b"abc").await.unwrap(), 3);
    assert!(matches!(pipeline.sum().await, Err(FileError::Storage(StorageError::Backend(_)))));
}

#[tokio::test]
async fn test_pieces_are_stored_as_they_complete() {
    let mut pipeline = Pipeline::new(FailingPutter, ModePut::Upload, false);
    let result = pipeline.write(&content(CHUNK * 8)).await;

    assert!(matches!(result, Err(FileError::Storage(StorageError::Backend(_)))));
    assert_eq!(pipeline.written(), CHUNK as u64);
}

#[tokio::test]
async fn test_short_pipeline_rejects_oversized_piece() {
    let store = MemoryStore::new();
    let factory = ShortPipelineFactory::new(&store, ModePut::Upload, false, HasherPool::default());
    let mut args = PipeWriteArgs::new(0, vec![0; 8 + CHUNK + 1]);

    let result = factory.create().write(&mut args).await;
    assert!(matches!(result, Err(FileError::ShortWrite { .. })));
    assert!(store.is_empty());
}

#[test]
fn test_factory_branching() {
    let store = MemoryStore::new();
    let plain = ShortPipelineFactory::new(&store, ModePut::Upload, false, HasherPool::default());
    let encrypted = ShortPipelineFactory::new(&store, ModePut::Upload, true, HasherPool::default());
    assert_eq!((plain.branching(), plain.reference_size()), (128, 32));
    assert_eq!((encrypted.branching(), encrypted.reference_size()), (64, 64));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn proptest_root_is_independent_of_write_boundaries(
        len in 0usize..(CHUNK * 6),
        splits in proptest::collection::vec(1usize..5000, 1..8),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let data = content(len);
        let (whole, split) = runtime.block_on(async {
            let whole = store_content(&MemoryStore::new(), &data, false).await;

            let store = MemoryStore::new();
            let mut pipeline = Pipeline::new(&store, ModePut::Upload, false);
            let mut rest = data.as_slice();
            for size in splits.iter().cycle() {
                if rest.is_empty() {
                    break;
                }
                let (head, tail) = rest.split_at((*size).min(rest.len()));
                pipeline.write(head).await.unwrap();
                rest = tail;
            }
            (whole, pipeline.sum().await.unwrap())
        });
        prop_assert_eq!(whole, split);
    }
}
