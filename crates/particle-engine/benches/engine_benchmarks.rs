//! Benchmarks for the particle engine hot paths.
//!
//! Run with: cargo bench --package particle-engine
//! Or: cargo bench --package particle-engine --bench engine_benchmarks

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use particle_engine::{FieldJob, GenerationToken, ParticleSystem, ScreenField, VelocityConfig};
use projection::{MercatorViewport, Projection};
use test_utils::{global_layout, zonal_jet_payload};
use vector_grid::Grid;
use velocity_common::{GeoExtent, PixelBounds};

fn jet_grid() -> Grid {
    vector_grid::decode(&zonal_jet_payload(&global_layout()))
        .expect("benchmark payload decodes")
        .grid
}

fn viewport(width: u32, height: u32) -> (MercatorViewport, PixelBounds, GeoExtent) {
    let extent = GeoExtent::new(-180.0, -80.0, 180.0, 80.0);
    let viewport = MercatorViewport::new(extent, width, height).expect("valid benchmark viewport");
    let bounds = viewport.pixel_bounds(&extent, width, height);
    (viewport, bounds, extent)
}

fn build_field(grid: &Grid, width: u32, height: u32) -> ScreenField {
    let (viewport, bounds, _) = viewport(width, height);
    FieldJob::new(&GenerationToken::new(), bounds, 0.01, Duration::from_secs(60))
        .run_to_completion(grid, &viewport)
        .expect("benchmark build completes")
}

// =============================================================================
// INTERPOLATION BENCHMARKS
// =============================================================================

fn bench_interpolation(c: &mut Criterion) {
    let grid = jet_grid();
    let mut group = c.benchmark_group("interpolation");

    group.bench_function("single_point", |b| {
        b.iter(|| grid.interpolate(black_box(12.34), black_box(-45.67)))
    });

    // Row of points crossing the dateline
    let points: Vec<(f64, f64)> = (0..1000).map(|i| (-180.0 + i as f64 * 0.36, 30.0)).collect();
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("row_1000", |b| {
        b.iter(|| {
            for &(lon, lat) in &points {
                black_box(grid.interpolate(lon, lat));
            }
        })
    });

    group.finish();
}

// =============================================================================
// FIELD SAMPLING BENCHMARKS
// =============================================================================

fn bench_field_sampling(c: &mut Criterion) {
    let grid = jet_grid();
    let mut group = c.benchmark_group("field_sampling");
    group.sample_size(20);

    for &(width, height) in &[(400u32, 300u32), (800, 600), (1600, 900)] {
        group.throughput(Throughput::Elements((width as u64 / 2) * (height as u64 / 2)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(width, height),
            |b, &(w, h)| b.iter(|| build_field(&grid, w, h)),
        );
    }

    group.finish();
}

// =============================================================================
// PARTICLE EVOLUTION BENCHMARKS
// =============================================================================

fn bench_evolve(c: &mut Criterion) {
    let grid = jet_grid();
    let field = build_field(&grid, 1200, 800);
    let mut group = c.benchmark_group("evolve");

    for &multiplier in &[1.0 / 300.0, 1.0 / 100.0, 1.0 / 30.0] {
        let config = VelocityConfig {
            particle_multiplier: multiplier,
            ..VelocityConfig::default()
        };
        let mut system = ParticleSystem::new(&config, StdRng::seed_from_u64(1));
        system.populate(&field);

        group.throughput(Throughput::Elements(system.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(system.len()), |b| {
            b.iter(|| {
                system.evolve(&field);
                system.commit_trails();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interpolation, bench_field_sampling, bench_evolve);
criterion_main!(benches);
