//! Index construction, query and selection encoding benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use splatedit_core::{
    IndexConfig, PartitionStrategy, PointIndex, SelectionSet, SortedIdPredicate,
};

/// Deterministic pseudo-random cloud (xorshift), no extra dependencies
fn generate_cloud(count: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let mut seed: u32 = 0x9E37_79B9;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        (seed as f32 / u32::MAX as f32) * 200.0 - 100.0
    };

    let mut x = Vec::with_capacity(count);
    let mut y = Vec::with_capacity(count);
    let mut z = Vec::with_capacity(count);
    for _ in 0..count {
        x.push(next());
        y.push(next());
        z.push(next());
    }
    (x, y, z)
}

// === Index Benchmarks ===

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for count in [1_000, 10_000, 100_000] {
        let (x, y, z) = generate_cloud(count);
        for partition in [PartitionStrategy::Select, PartitionStrategy::Sort] {
            let config = IndexConfig { partition };
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", partition), count),
                &config,
                |b, config| {
                    b.iter(|| PointIndex::build_with_config(black_box(&x), &y, &z, config))
                },
            );
        }
    }
    group.finish();
}

fn bench_find_nearest(c: &mut Criterion) {
    let (x, y, z) = generate_cloud(100_000);
    let index = PointIndex::build(&x, &y, &z).unwrap();
    let queries: Vec<[f32; 3]> = (0..256).map(|i| [x[i] + 0.5, y[i] - 0.25, z[i]]).collect();

    let mut group = c.benchmark_group("find_nearest_100k");
    group.bench_function("unfiltered", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(index.find_nearest(*q));
            }
        })
    });
    group.bench_function("filtered_half", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(index.find_nearest_filtered(*q, |i| i % 2 == 0));
            }
        })
    });
    group.bench_function("k_nearest_20", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(index.find_k_nearest(*q, 20, |_| true));
            }
        })
    });
    group.finish();
}

// === Selection Benchmarks ===

fn bench_selection(c: &mut Criterion) {
    let total = 1_000_000;
    let mut group = c.benchmark_group("selection_1m");

    group.bench_function("coherent_runs", |b| {
        b.iter(|| SelectionSet::from_predicate(total, |i: usize| (i / 1000) % 3 == 0))
    });
    group.bench_function("scattered", |b| {
        b.iter(|| SelectionSet::from_predicate(total, |i: usize| i % 3 == 0))
    });

    let ids: Vec<u32> = (0..total as u32).filter(|i| i % 5 < 2).collect();
    group.bench_function("sorted_ids", |b| {
        b.iter(|| SelectionSet::from_predicate(total, SortedIdPredicate::new(black_box(&ids))))
    });

    let set = SelectionSet::from_predicate(total, |i: usize| (i / 1000) % 3 == 0).unwrap();
    group.bench_function("for_each", |b| {
        b.iter(|| {
            let mut sum = 0usize;
            set.for_each(|i| sum += i);
            black_box(sum)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_find_nearest, bench_selection);
criterion_main!(benches);
