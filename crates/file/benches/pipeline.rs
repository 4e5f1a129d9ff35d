#![allow(missing_docs)]
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{RngCore, rng};
use tokio::runtime::{Builder, Runtime};

use nectar_file::{Joiner, Pipeline};
use nectar_primitives::MAX_CHUNK_SIZE;
use nectar_storage::{MemoryStore, ModePut};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rng().fill_bytes(&mut data);
    data
}

fn runtime() -> Runtime {
    Builder::new_current_thread().build().unwrap()
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let rt = runtime();

    for chunks in [1, 16, 256] {
        let data = random_bytes(chunks * MAX_CHUNK_SIZE);
        group.throughput(Throughput::Bytes(data.len() as u64));
        for encrypt in [false, true] {
            let id = BenchmarkId::new(if encrypt { "encrypted" } else { "plain" }, chunks);
            group.bench_with_input(id, &data, |b, data| {
                b.iter(|| {
                    rt.block_on(async {
                        let store = MemoryStore::new();
                        let mut pipeline = Pipeline::new(&store, ModePut::Upload, encrypt);
                        pipeline.write(data).await.unwrap();
                        pipeline.sum().await.unwrap()
                    })
                });
            });
        }
    }

    group.finish();
}

fn bench_joiner(c: &mut Criterion) {
    let mut group = c.benchmark_group("joiner");
    let rt = runtime();
    let store = MemoryStore::new();

    for chunks in [16, 256] {
        let data = random_bytes(chunks * MAX_CHUNK_SIZE);
        let root = rt.block_on(async {
            let mut pipeline = Pipeline::new(&store, ModePut::Upload, false);
            pipeline.write(&data).await.unwrap();
            pipeline.sum().await.unwrap()
        });

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("read_all", chunks), &root, |b, root| {
            b.iter(|| {
                rt.block_on(async { Joiner::open(&store, root).await.unwrap().read_all().await.unwrap() })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_joiner);
criterion_main!(benches);
