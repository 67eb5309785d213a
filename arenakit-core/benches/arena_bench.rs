#[macro_use]
extern crate criterion;

use bumpalo::Bump;
use criterion::{black_box, Criterion, Throughput};

use arenakit_core::{Allocator, Arena, ArenaOptions, FixedBlock, Region};

const BATCH: usize = 1024;

fn bench_small_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("small_allocations");
    group.throughput(Throughput::Elements(BATCH as u64));

    for size in [8usize, 64, 256] {
        group.bench_function(format!("arena_{}", size), |b| {
            let options = ArenaOptions::new()
                .initial_capacity(BATCH * size * 2)
                .retain_capacity(true);
            let mut arena = Arena::with_options(options).unwrap();
            b.iter(|| {
                for _ in 0..BATCH {
                    black_box(arena.alloc(size, 8).unwrap());
                }
                arena.clear();
            });
        });

        group.bench_function(format!("region_{}", size), |b| {
            let mut region = Region::with_capacity(BATCH * size * 2)
                .unwrap()
                .retain_capacity(true);
            b.iter(|| {
                for _ in 0..BATCH {
                    black_box(region.alloc(size, 8).unwrap());
                }
                region.clear();
            });
        });

        group.bench_function(format!("fixed_{}", size), |b| {
            let mut block = FixedBlock::new(BATCH * size * 2).unwrap();
            b.iter(|| {
                for _ in 0..BATCH {
                    black_box(block.alloc(size, 8).unwrap());
                }
                block.clear();
            });
        });

        group.bench_function(format!("bumpalo_{}", size), |b| {
            let mut bump = Bump::with_capacity(BATCH * size * 2);
            let layout = std::alloc::Layout::from_size_align(size, 8).unwrap();
            b.iter(|| {
                for _ in 0..BATCH {
                    black_box(bump.alloc_layout(layout));
                }
                bump.reset();
            });
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut arena = Arena::new();
    let ptrs: Vec<_> = (0..BATCH).map(|_| arena.alloc(16, 8).unwrap()).collect();

    c.bench_function("arena_resolve", |b| {
        b.iter(|| {
            for ptr in &ptrs {
                black_box(arena.resolve(*ptr, 16).unwrap());
            }
        });
    });
}

fn bench_growth(c: &mut Criterion) {
    c.bench_function("region_growth_from_empty", |b| {
        b.iter(|| {
            let mut region = Region::new().first_bucket_size(4096).unwrap();
            for _ in 0..BATCH {
                black_box(region.alloc(512, 8).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_small_allocations, bench_resolve, bench_growth);
criterion_main!(benches);
