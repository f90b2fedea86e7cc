//! Performance benchmarks for the topology engine.
//!
//! Run with: `cargo bench --features synthetic`
//!
//! These benchmarks use synthetic grid networks to measure the cost of
//! building a network, cascading path edits and overlap queries.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use geo::Coord;
use rand::Rng;
use trailtopo::synthetic::{NetworkScenario, SyntheticNetwork};
use trailtopo::{overlapping, TopologyConfig, TopologyEngine};

// ============================================================================
// Scenarios
// ============================================================================

fn grid(size: usize, topologies: usize) -> SyntheticNetwork {
    NetworkScenario {
        rows: size,
        cols: size,
        point_topologies: topologies,
        line_topologies: topologies / 2,
        ..NetworkScenario::default()
    }
    .generate()
}

fn loaded(dataset: &SyntheticNetwork) -> (TopologyEngine, Vec<u64>, Vec<u64>) {
    dataset
        .load(TopologyConfig::default())
        .expect("synthetic network loads")
}

// ============================================================================
// Benchmarks
// ============================================================================

/// Benchmark building networks of growing size, snapping and splitting included.
fn bench_network_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("network_build");
    group.sample_size(10);

    for size in [5, 10, 20].iter() {
        let dataset = grid(*size, 0);
        group.bench_with_input(BenchmarkId::new("grid", size), &dataset, |b, d| {
            b.iter(|| loaded(black_box(d)))
        });
    }

    group.finish();
}

/// Benchmark a path split cascading into many topologies.
fn bench_split_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_cascade");

    for topologies in [100, 1000, 5000].iter() {
        let dataset = NetworkScenario {
            rows: 2,
            cols: 2,
            point_topologies: *topologies,
            line_topologies: *topologies / 2,
            ..NetworkScenario::default()
        }
        .generate();

        group.bench_with_input(
            BenchmarkId::new("topologies", topologies),
            &dataset,
            |b, d| {
                b.iter_batched(
                    || loaded(d),
                    |(mut engine, paths, _)| {
                        engine.split_path(paths[0], black_box(0.5)).expect("split");
                        engine
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

/// Benchmark overlap queries ("filter by trail").
fn bench_overlap(c: &mut Criterion) {
    let dataset = grid(10, 2000);
    let (engine, _, topologies) = loaded(&dataset);
    let mut rng = rand::thread_rng();
    let edges: Vec<u64> = (0..20)
        .map(|_| topologies[rng.gen_range(0..topologies.len())])
        .collect();

    c.bench_function("overlap_20_edges_3000_topologies", |b| {
        b.iter(|| overlapping(black_box(&engine), black_box(&edges)))
    });
}

/// Benchmark locating free points on the network.
fn bench_locate(c: &mut Criterion) {
    let dataset = grid(10, 0);
    let (mut engine, _, _) = loaded(&dataset);
    let origin = NetworkScenario::default().origin;
    let mut rng = rand::thread_rng();
    let points: Vec<Coord<f64>> = (0..100)
        .map(|_| Coord {
            x: origin.x + rng.gen_range(0.0..4500.0),
            y: origin.y + rng.gen_range(0.0..4500.0),
        })
        .collect();

    c.bench_function("locate_100_points", |b| {
        b.iter(|| {
            for p in &points {
                black_box(engine.locate(*p).expect("network is not empty"));
            }
        })
    });
}

/// Benchmark recomputing every geometry after the whole network moved.
fn bench_recompute(c: &mut Criterion) {
    let dataset = grid(10, 2000);

    c.bench_function("recompute_3000_geometries", |b| {
        b.iter_batched(
            || {
                let (mut engine, _, topologies) = loaded(&dataset);
                engine.geometries.mark_many_dirty(topologies);
                engine
            },
            |mut engine| {
                engine.ensure_computed();
                engine
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_network_build,
    bench_split_cascade,
    bench_overlap,
    bench_locate,
    bench_recompute,
);
criterion_main!(benches);
