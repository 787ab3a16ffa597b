//! Benchmark for planet generation and brush edits.
//!
//! Run with: cargo bench --package voxel_planet --bench planet_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use glam::DVec3;
use voxel_planet::{
    AltitudeBands, Chunk, ChunkCoord, DensityField, MaterialLookup, PlanetConfig, PlanetDensity,
    VoxelPlanet,
};

fn bench_config() -> PlanetConfig {
    PlanetConfig::default()
        .with_seed(42)
        .with_radius(60.0)
        .with_shell_thickness(12.0)
        .with_chunk_size(16)
}

fn benchmark_density(c: &mut Criterion) {
    let field = PlanetDensity::new(&PlanetConfig::default().with_seed(42));

    c.bench_function("density_sample", |b| {
        let mut t = 0.0f64;
        b.iter(|| {
            t += 0.01;
            let p = DVec3::new(t.cos(), t.sin(), (t * 0.3).sin()).normalize() * 205.0;
            black_box(field.density(black_box(p)))
        });
    });
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let config = PlanetConfig::default().with_seed(42);
    let field = PlanetDensity::new(&config);
    let lookup = AltitudeBands::new(config.radius + config.surface_offset);
    let materials: &dyn MaterialLookup = &lookup;

    // A chunk straddling the surface above the north pole.
    let mut chunk = Chunk::new(ChunkCoord::new(7, 13, 7), 32, 1.0, -228.0);

    let mut group = c.benchmark_group("chunk");
    group.throughput(Throughput::Elements(34 * 34 * 34));
    group.bench_function("generate_mesh_32", |b| {
        b.iter(|| {
            chunk.generate_mesh(&field, materials);
            black_box(chunk.revision())
        });
    });
    group.finish();
}

fn benchmark_planet(c: &mut Criterion) {
    let mut group = c.benchmark_group("planet");
    group.sample_size(10);

    group.bench_function("generate_sequential", |b| {
        let mut planet = VoxelPlanet::new(bench_config()).unwrap();
        b.iter(|| {
            planet.generate();
            black_box(planet.stats())
        });
    });

    group.bench_function("generate_parallel", |b| {
        let mut planet = VoxelPlanet::new(bench_config()).unwrap();
        b.iter(|| {
            planet.generate_parallel();
            black_box(planet.stats())
        });
    });

    group.bench_function("brush_edit", |b| {
        let mut planet = VoxelPlanet::new(bench_config()).unwrap();
        planet.generate_parallel();
        let surface = planet.config().radius + planet.config().surface_offset;
        let mut angle = 0.0f64;
        b.iter(|| {
            angle += 0.1;
            let center = DVec3::new(angle.cos(), 0.0, angle.sin()) * surface;
            black_box(planet.modify_density(center, -2.0, 3.0).unwrap())
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = benchmark_density,
              benchmark_single_chunk,
              benchmark_planet
}

criterion_main!(benches);
