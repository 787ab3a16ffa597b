//! # Edit Tests
//!
//! Brush edits change the density locally and rebuild only the chunks
//! whose bounds the brush sphere reaches.

use glam::DVec3;
use voxel_planet::{
    Brush, DensityField, NoiseLayer, PlanetConfig, PlanetError, TerrainConfig, VoxelKey,
    VoxelPlanet,
};

/// Terrain scaled down to a planet a few chunks across.
fn hills() -> TerrainConfig {
    TerrainConfig {
        material_weight: 0.01,
        continent: NoiseLayer::new(0.02, 2.0),
        ridge: NoiseLayer::new(0.05, 1.5),
        detail: NoiseLayer::new(0.1, 1.0),
        micro: NoiseLayer::new(0.3, 0.3),
        biome: NoiseLayer::new(0.05, 1.0),
    }
}

fn small_planet(seed: u64) -> VoxelPlanet {
    let config = PlanetConfig {
        terrain: hills(),
        ..PlanetConfig::default()
    }
    .with_seed(seed)
    .with_radius(16.0)
    .with_shell_thickness(6.0)
    .with_surface_offset(1.0)
    .with_chunk_size(8);
    VoxelPlanet::new(config).unwrap()
}

fn flat_planet() -> VoxelPlanet {
    let config = PlanetConfig {
        terrain: TerrainConfig::flat(),
        ..PlanetConfig::default()
    }
    .with_radius(16.0)
    .with_shell_thickness(6.0)
    .with_surface_offset(1.0)
    .with_chunk_size(8);
    VoxelPlanet::new(config).unwrap()
}

#[test]
fn test_edit_only_touches_intersecting_chunks() {
    let mut planet = small_planet(7);
    planet.generate();
    let before: Vec<_> = planet
        .chunks()
        .iter()
        .map(|c| (c.revision(), c.mesh().cloned()))
        .collect();

    let center = DVec3::new(3.0, 16.5, -2.0);
    let brush = Brush::new(center, -5.0, 3.5).unwrap();
    let report = planet.modify_density(center, -5.0, 3.5).unwrap();

    assert!(!report.chunks_regenerated.is_empty());
    assert!(report.chunks_regenerated.len() < planet.chunk_count());

    for (i, chunk) in planet.chunks().iter().enumerate() {
        let (min, max) = chunk.bounds();
        let touched = brush.intersects_aabb(min, max);
        assert_eq!(report.chunks_regenerated.contains(&i), touched, "chunk {i}");

        let (revision, mesh) = &before[i];
        if touched {
            assert_eq!(chunk.revision(), revision + 1);
        } else {
            assert_eq!(chunk.revision(), *revision);
            assert_eq!(chunk.mesh(), mesh.as_ref(), "untouched chunk {i} changed");
        }
    }
}

#[test]
fn test_dig_then_fill_restores_density() {
    let mut planet = flat_planet();
    let target = DVec3::new(0.0, 0.0, 15.0);
    let original = planet.density_at(target);
    assert!(original < 0.0);

    planet.modify_density(target, -4.0, 3.0).unwrap();
    assert!(planet.density_at(target) > 0.0, "digging should open air");

    planet.modify_density(target, 4.0, 3.0).unwrap();
    assert!((planet.density_at(target) - original).abs() < 1e-9);
}

#[test]
fn test_repeated_edits_accumulate() {
    let center = DVec3::new(-2.0, 17.0, 1.0);

    let mut twice = flat_planet();
    twice.modify_density(center, 1.5, 2.0).unwrap();
    twice.modify_density(center, 1.5, 2.0).unwrap();

    let mut once = flat_planet();
    once.modify_density(center, 3.0, 2.0).unwrap();

    let key = VoxelKey::quantize(center, 1.0);
    assert!((twice.overlay().get(key) - once.overlay().get(key)).abs() < 1e-12);
    assert!((once.overlay().get(key) + 3.0).abs() < 1e-12);
    assert_eq!(twice.overlay().len(), once.overlay().len());

    for (key, value) in once.overlay().iter() {
        assert!((twice.overlay().get(key) - value).abs() < 1e-12);
    }
}

#[test]
fn test_dig_changes_local_mesh() {
    let mut planet = flat_planet();
    planet.generate();

    // Just under the surface at radius 17.
    let target = DVec3::new(0.0, 15.0, 0.0);
    let index = planet.chunk_index_at(target).unwrap();
    let before = planet.chunk(index).unwrap().mesh().cloned();
    assert!(before.is_some());

    let report = planet.modify_density(target, -20.0, 4.0).unwrap();
    assert!(report.chunks_regenerated.contains(&index));
    assert_ne!(planet.chunk(index).unwrap().mesh().cloned(), before);
}

#[test]
fn test_field_matches_planet_density() {
    let mut planet = small_planet(3);
    planet.modify_density(DVec3::new(0.0, 17.0, 0.0), -2.0, 2.0).unwrap();

    let p = DVec3::new(0.4, 16.6, -0.3);
    assert_eq!(planet.density_field().density(p), planet.density_at(p));
}

#[test]
fn test_invalid_brushes_are_rejected() {
    let mut planet = small_planet(1);
    let cases = [
        (DVec3::ZERO, 1.0, 0.0),
        (DVec3::ZERO, 1.0, -2.0),
        (DVec3::ZERO, f64::NAN, 2.0),
        (DVec3::new(f64::INFINITY, 0.0, 0.0), 1.0, 2.0),
    ];
    for (center, strength, radius) in cases {
        assert!(matches!(
            planet.modify_density(center, strength, radius),
            Err(PlanetError::InvalidBrush(_))
        ));
    }
    assert!(planet.overlay().is_empty());
}

#[test]
fn test_edit_outside_lattice_touches_nothing() {
    let mut planet = small_planet(5);
    let report = planet
        .modify_density(DVec3::new(500.0, 0.0, 0.0), -3.0, 2.0)
        .unwrap();

    assert!(report.voxels_modified > 0);
    assert!(report.chunks_regenerated.is_empty());
}

#[test]
fn test_far_brush_centres_do_not_panic() {
    let mut planet = small_planet(9);
    planet.generate();

    for center in [
        DVec3::new(1e300, 0.0, 0.0),
        DVec3::new(-1e300, 0.0, 0.0),
        DVec3::new(0.0, 1e300, -1e300),
        DVec3::splat(-f64::MAX),
    ] {
        let report = planet.modify_density(center, -1.0, 1.0).unwrap();
        assert!(report.chunks_regenerated.is_empty(), "{center}");
    }
    assert!(planet.chunks().iter().all(|c| c.revision() == 1));
}

#[test]
fn test_brush_just_beyond_lattice() {
    let mut planet = small_planet(9);
    let edge = planet.world_max();

    let report = planet
        .modify_density(DVec3::new(edge + 2.5, 0.0, 0.0), -1.0, 2.0)
        .unwrap();
    assert!(report.chunks_regenerated.is_empty());

    let report = planet
        .modify_density(DVec3::new(edge + 1.5, 0.0, 0.0), -1.0, 2.0)
        .unwrap();
    assert!(!report.chunks_regenerated.is_empty());
    let n = planet.chunks_per_axis();
    for &index in &report.chunks_regenerated {
        assert_eq!(planet.chunk(index).unwrap().coord().x, n - 1);
    }
}

#[test]
fn test_oversized_brush_is_rejected() {
    let mut planet = flat_planet();
    let result = planet.modify_density(DVec3::new(0.0, 17.0, 0.0), -1.0, 1e5);

    assert!(matches!(result, Err(PlanetError::InvalidBrush(_))));
    assert!(planet.overlay().is_empty());
}
