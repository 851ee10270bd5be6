use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use safemap::{KeyHasher, ShardedMap};

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 10_000;

fn bench_parallel_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_set");
    group.throughput(Throughput::Elements((THREADS * OPS_PER_THREAD) as u64));

    for shards in [1usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(shards), &shards, |b, &shards| {
            let map: ShardedMap<usize, usize> = ShardedMap::with_shards(shards);
            b.iter(|| {
                thread::scope(|s| {
                    for t in 0..THREADS {
                        let map = &map;
                        s.spawn(move || {
                            for i in 0..OPS_PER_THREAD {
                                map.set(t * OPS_PER_THREAD + i, i);
                            }
                        });
                    }
                });
            });
        });
    }
    group.finish();
}

fn bench_parallel_get(c: &mut Criterion) {
    let map: ShardedMap<usize, usize> = ShardedMap::new();
    for i in 0..1024 {
        map.set(i, i);
    }

    let mut group = c.benchmark_group("parallel_get");
    group.throughput(Throughput::Elements((THREADS * OPS_PER_THREAD) as u64));
    group.bench_function("default_shards", |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..THREADS {
                    let map = &map;
                    s.spawn(move || {
                        for i in 0..OPS_PER_THREAD {
                            black_box(map.get(&(i % 1024)));
                        }
                    });
                }
            });
        });
    });
    group.finish();
}

fn bench_hasher(c: &mut Criterion) {
    let hasher = KeyHasher::new();
    let mut group = c.benchmark_group("hasher");

    group.bench_function("integer", |b| b.iter(|| hasher.hash(black_box(&123_456u64))));
    group.bench_function("string", |b| {
        b.iter(|| hasher.hash(black_box("user:123456:session")))
    });
    group.bench_function("encoded_tuple", |b| {
        b.iter(|| hasher.hash(black_box(&("user", 123_456u64, true))))
    });
    group.finish();
}

criterion_group!(benches, bench_parallel_set, bench_parallel_get, bench_hasher);
criterion_main!(benches);
