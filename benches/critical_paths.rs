//! Criterion benchmarks for stitchcons critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Resolve: flattening nested lists and dereferencing shared transforms
//! - Consolidate: merging affine runs, with and without promotion
//! - Section: rewriting every tile of a section
//! - Wire: parsing section JSON

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stitchcons::models::{ResolvedTiles, TileSpec, TransformSpec};
use stitchcons::registry::TransformRegistry;
use stitchcons::stack::consolidate_section;
use stitchcons::transforms::{
    consolidate, resolve, AffineModel, LeafTransform, PolyDegree, Transform, TransformRange,
};

// =============================================================================
// Test Data Generators
// =============================================================================

fn lens() -> Transform {
    Transform::Opaque(LeafTransform::new(
        "mpicbg.trakem2.transform.NonLinearCoordinateTransform",
        "5 2 0.1 0.2 0.3 0.4",
    ))
}

/// A transform list of `len` entries: affine runs broken by a barrier every `barrier_every`.
fn make_list(len: usize, barrier_every: usize) -> Vec<Transform> {
    (0..len)
        .map(|i| {
            if barrier_every > 0 && i % barrier_every == barrier_every - 1 {
                lens()
            } else {
                AffineModel::new(1.0, 0.001 * i as f64, -0.001 * i as f64, 1.0, i as f64, 0.5)
                    .into()
            }
        })
        .collect()
}

/// A list nested `depth` levels deep with one reference at every level.
fn make_nested(depth: usize) -> Vec<Transform> {
    let mut list = vec![Transform::reference("lens"), AffineModel::translation(1.0, 1.0).into()];
    for _ in 0..depth {
        list = vec![
            Transform::List(list),
            Transform::reference("lens"),
            AffineModel::scale(1.01, 1.01).into(),
        ];
    }
    list
}

fn make_pool() -> TransformRegistry {
    let mut pool = TransformRegistry::new();
    pool.register("lens", lens()).expect("lens is concrete");
    pool
}

fn make_section(tiles: usize) -> ResolvedTiles {
    let tile_specs = (0..tiles)
        .map(|i| {
            let mut transforms = vec![Transform::reference("lens")];
            transforms.extend(make_list(6, 0));
            TileSpec::new(format!("tile-{}", i), 1.0, transforms)
        })
        .collect();
    ResolvedTiles::new(tile_specs, vec![TransformSpec::from(lens()).with_id("lens")])
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let pool = make_pool();

    for depth in [1, 8, 32] {
        let list = make_nested(depth);
        group.bench_with_input(BenchmarkId::new("nested", depth), &list, |b, list| {
            b.iter(|| resolve(black_box(list), &pool))
        });
    }

    group.finish();
}

fn bench_consolidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("consolidate");
    let pool = make_pool();

    for len in [4, 64, 1024] {
        let list = make_list(len, 0);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("affine_run", len), &list, |b, list| {
            b.iter(|| consolidate(black_box(list), &pool, PolyDegree::AFFINE))
        });
    }

    let list = make_list(256, 8);
    group.bench_function("with_barriers_256", |b| {
        b.iter(|| consolidate(black_box(&list), &pool, PolyDegree::AFFINE))
    });

    let degree = PolyDegree::new(3).expect("degree is non-negative");
    group.bench_function("promote_degree_3_256", |b| {
        b.iter(|| consolidate(black_box(&list), &pool, degree))
    });

    group.finish();
}

fn bench_section(c: &mut Criterion) {
    let mut group = c.benchmark_group("section");
    let range = TransformRange::full();

    for tiles in [10, 100, 1000] {
        let section = make_section(tiles);
        group.throughput(Throughput::Elements(tiles as u64));
        group.bench_with_input(BenchmarkId::new("consolidate", tiles), &section, |b, s| {
            b.iter(|| consolidate_section(black_box(s), &range, PolyDegree::AFFINE))
        });
    }

    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");
    let json = serde_json::to_string(&make_section(200)).expect("section serializes");

    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function("parse_section_200", |b| {
        b.iter(|| serde_json::from_str::<ResolvedTiles>(black_box(&json)))
    });

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_consolidate, bench_section, bench_wire);
criterion_main!(benches);
