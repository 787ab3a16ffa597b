//! # Config File Tests
//!
//! The shipped planet file must load and match the built-in defaults.

use voxel_planet::{PlanetConfig, VoxelPlanet};

fn shipped_config_path() -> String {
    format!("{}/data/planet.toml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_shipped_config_loads() {
    let config = PlanetConfig::load(shipped_config_path()).unwrap();
    assert_eq!(config, PlanetConfig::default().with_seed(1337));
}

#[test]
fn test_shipped_config_lattice() {
    let config = PlanetConfig::load(shipped_config_path()).unwrap();
    let planet = VoxelPlanet::new(config).unwrap();

    // extent 228, span 32: ceil(456 / 32) = 15.
    assert_eq!(planet.chunks_per_axis(), 15);
    assert_eq!(planet.chunk_count(), 15 * 15 * 15);
    assert!(planet.world_max() >= 228.0);
}
