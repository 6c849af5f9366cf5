//! # Change-Tracking Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | Filter | record a modification | O(1), one slot write lock |
//! | Directory | take + merge back | O(bloom size) |
//! | Drops | add / drain | O(1) add, O(ring) drain |
//! | Read | full committed read | O(relations in catalog) |

use std::sync::Arc;
use std::time::Duration;

use change_tracking::{
    BloomFilter, BloomSet, ChangeTrackingApi, DropsTrack, InMemorySettingsStore,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tracking_tests::fixtures::{segment, small_config, DB, FIRST_RELFILENODE};

// ============================================================================
// FILTER: bit setting through the directory
// ============================================================================

fn bench_set_bit(c: &mut Criterion) {
    let mut group = c.benchmark_group("bloom-set");
    group.measurement_time(Duration::from_secs(5));

    for slots in [1usize, 16, 256] {
        let set = BloomSet::new(slots, 1024 * 1024);
        for owner in 1..=slots as u32 {
            set.bind(owner);
        }
        let owner = slots as u32;
        let relfilenodes: Vec<u32> = {
            let mut rng = rand::thread_rng();
            (0..1000).map(|_| rng.gen_range(16_384..1_000_000)).collect()
        };

        group.throughput(Throughput::Elements(relfilenodes.len() as u64));
        group.bench_with_input(BenchmarkId::new("set_bit", slots), &relfilenodes, |b, rels| {
            b.iter(|| {
                for rel in rels {
                    black_box(set.set_bit(owner, *rel));
                }
            })
        });
    }

    group.finish();
}

fn bench_take_merge_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("bloom-take");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let set = BloomSet::new(4, size);
        set.bind(DB);
        let mut dest = BloomFilter::new(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(BenchmarkId::new("take_merge_back", size), |b| {
            b.iter(|| {
                set.take(DB, &mut dest);
                black_box(set.merge_back(DB, &dest))
            })
        });
    }

    group.finish();
}

// ============================================================================
// DROPS: ring add and drain
// ============================================================================

fn bench_drops(c: &mut Criterion) {
    let mut group = c.benchmark_group("drops-track");

    for capacity in [1_000usize, 100_000] {
        let drops = DropsTrack::new(capacity);
        group.bench_function(BenchmarkId::new("add_full_ring", capacity), |b| {
            let mut rel = 0u32;
            b.iter(|| {
                rel = rel.wrapping_add(1);
                black_box(drops.add(rel, DB))
            })
        });

        group.bench_function(BenchmarkId::new("fill_and_drain", capacity), |b| {
            b.iter(|| {
                for rel in 0..capacity as u32 {
                    drops.add(rel, if rel % 2 == 0 { DB } else { DB + 1 });
                }
                black_box(drops.drain(DB).len())
            })
        });
    }

    group.finish();
}

// ============================================================================
// READ: one committed read against the in-memory catalog
// ============================================================================

fn bench_committed_read(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("read-modifications");

    for tables in [100u32, 10_000] {
        let seg = runtime.block_on(async {
            let seg = segment(small_config(0), tables, Arc::new(InMemorySettingsStore::new()));
            seg.register_database(DB).await.expect("register");
            seg
        });

        group.throughput(Throughput::Elements(u64::from(tables)));
        group.bench_function(BenchmarkId::new("modified_tenth", tables), |b| {
            b.iter(|| {
                for i in (0..tables).step_by(10) {
                    seg.record_object_modified(DB, FIRST_RELFILENODE + i);
                }
                let rows = runtime
                    .block_on(seg.read_modifications(DB))
                    .expect("read");
                black_box(rows.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_set_bit,
    bench_take_merge_back,
    bench_drops,
    bench_committed_read
);
criterion_main!(benches);
