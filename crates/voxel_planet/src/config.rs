//! # Planet Configuration
//!
//! Host-supplied settings, loaded once at startup from TOML:
//!
//! ```toml
//! seed = 1337
//! radius = 200.0
//! voxel_resolution = 1.0
//! chunk_size = 32
//! shell_thickness = 20.0
//! surface_offset = 8.0
//!
//! [terrain.continent]
//! frequency = 0.0008
//! amplitude = 45.0
//!
//! [generation]
//! batch_size = 8
//! ```
//!
//! Every field has a default, so a partial file (or an empty one) is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlanetError, PlanetResult};
use crate::noise::WorldSeed;

/// Top-level planet configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    /// Seed for every noise layer.
    pub seed: WorldSeed,
    /// Nominal planet radius in world units.
    pub radius: f64,
    /// World units per voxel step.
    pub voxel_resolution: f64,
    /// Voxels per chunk axis, excluding padding.
    pub chunk_size: usize,
    /// Half-width of the band around `radius` where terrain exists.
    pub shell_thickness: f64,
    /// Extra height added to the radius for the mean terrain surface.
    pub surface_offset: f64,
    /// Terrain noise layers.
    pub terrain: TerrainConfig,
    /// Generation scheduling.
    pub generation: GenerationConfig,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default(),
            radius: 200.0,
            voxel_resolution: 1.0,
            chunk_size: 32,
            shell_thickness: 20.0,
            surface_offset: 8.0,
            terrain: TerrainConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl PlanetConfig {
    /// Parses a config from TOML text. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::ConfigParse`] for malformed TOML and
    /// [`PlanetError::InvalidConfig`] for out-of-domain values.
    pub fn from_toml_str(text: &str) -> PlanetResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::ConfigIo`] if the file cannot be read, plus
    /// everything [`PlanetConfig::from_toml_str`] can return.
    pub fn load(path: impl AsRef<Path>) -> PlanetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PlanetError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every value against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> PlanetResult<()> {
        require_positive("radius", self.radius)?;
        require_positive("voxel_resolution", self.voxel_resolution)?;
        require_positive("shell_thickness", self.shell_thickness)?;
        if !self.surface_offset.is_finite() || self.surface_offset < 0.0 {
            return Err(PlanetError::config(
                "surface_offset",
                format!("must be finite and non-negative, got {}", self.surface_offset),
            ));
        }
        if self.chunk_size == 0 {
            return Err(PlanetError::config("chunk_size", "must be at least 1"));
        }
        self.terrain.validate()?;
        self.generation.validate()
    }

    /// Half-width of the cube the chunk lattice must cover.
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.radius + self.shell_thickness + self.surface_offset
    }

    /// World-space edge length of one chunk.
    #[must_use]
    pub fn chunk_span(&self) -> f64 {
        self.chunk_size as f64 * self.voxel_resolution
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = WorldSeed::new(seed);
        self
    }

    /// Sets the planet radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Sets the voxel resolution.
    #[must_use]
    pub fn with_voxel_resolution(mut self, voxel_resolution: f64) -> Self {
        self.voxel_resolution = voxel_resolution;
        self
    }

    /// Sets the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the shell thickness.
    #[must_use]
    pub fn with_shell_thickness(mut self, shell_thickness: f64) -> Self {
        self.shell_thickness = shell_thickness;
        self
    }

    /// Sets the surface offset.
    #[must_use]
    pub fn with_surface_offset(mut self, surface_offset: f64) -> Self {
        self.surface_offset = surface_offset;
        self
    }
}

/// One band-limited noise layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayer {
    /// Spatial frequency (1 / world units).
    pub frequency: f64,
    /// Output scale in density units.
    pub amplitude: f64,
    /// Fractal octaves; 1 is plain simplex noise.
    pub octaves: u32,
}

impl NoiseLayer {
    /// A single-octave layer.
    #[must_use]
    pub const fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
            octaves: 1,
        }
    }

    /// A layer that contributes nothing.
    #[must_use]
    pub const fn silent() -> Self {
        Self::new(1.0, 0.0)
    }

    fn validate(&self, field: &'static str) -> PlanetResult<()> {
        require_positive(field, self.frequency)?;
        if !self.amplitude.is_finite() {
            return Err(PlanetError::config(field, "amplitude must be finite"));
        }
        if self.octaves == 0 {
            return Err(PlanetError::config(field, "octaves must be at least 1"));
        }
        Ok(())
    }
}

impl Default for NoiseLayer {
    fn default() -> Self {
        Self::silent()
    }
}

/// Terrain noise stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Weight of the elevation-band material offset in the density.
    pub material_weight: f64,
    /// Continent-scale undulation.
    pub continent: NoiseLayer,
    /// Ridged mountain ranges.
    pub ridge: NoiseLayer,
    /// Hills.
    pub detail: NoiseLayer,
    /// Surface roughness.
    pub micro: NoiseLayer,
    /// Low-frequency variation of the material offset.
    pub biome: NoiseLayer,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            material_weight: 0.01,
            continent: NoiseLayer::new(0.0008, 45.0),
            ridge: NoiseLayer::new(0.004, 18.0),
            detail: NoiseLayer::new(0.025, 8.0),
            micro: NoiseLayer::new(0.08, 2.0),
            biome: NoiseLayer::new(0.005, 5.0),
        }
    }
}

impl TerrainConfig {
    /// A terrain with no noise at all: the surface is a perfect sphere.
    #[must_use]
    pub fn flat() -> Self {
        Self {
            material_weight: 0.0,
            continent: NoiseLayer::silent(),
            ridge: NoiseLayer::silent(),
            detail: NoiseLayer::silent(),
            micro: NoiseLayer::silent(),
            biome: NoiseLayer::silent(),
        }
    }

    fn validate(&self) -> PlanetResult<()> {
        self.continent.validate("terrain.continent")?;
        self.ridge.validate("terrain.ridge")?;
        self.detail.validate("terrain.detail")?;
        self.micro.validate("terrain.micro")?;
        self.biome.validate("terrain.biome")?;
        if !self.material_weight.is_finite() {
            return Err(PlanetError::config("terrain.material_weight", "must be finite"));
        }
        Ok(())
    }
}

/// Generation scheduling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chunks meshed between two yields of progressive generation.
    pub batch_size: usize,
    /// Use the rayon pool for bulk generation.
    pub parallel: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            parallel: false,
        }
    }
}

impl GenerationConfig {
    fn validate(&self) -> PlanetResult<()> {
        if self.batch_size == 0 {
            return Err(PlanetError::config("generation.batch_size", "must be at least 1"));
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> PlanetResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlanetError::config(
            field,
            format!("must be finite and positive, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlanetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 32);
        assert!((config.extent() - 228.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PlanetConfig::from_toml_str(
            r#"
            seed = 99
            radius = 50.0
            chunk_size = 8

            [terrain.ridge]
            frequency = 0.01
            amplitude = 3.0

            [generation]
            batch_size = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, WorldSeed::new(99));
        assert!((config.radius - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.terrain.ridge, NoiseLayer::new(0.01, 3.0));
        assert_eq!(config.terrain.detail, TerrainConfig::default().detail);
        assert_eq!(config.generation.batch_size, 4);
        assert!(!config.generation.parallel);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let cases = [
            PlanetConfig::default().with_radius(0.0),
            PlanetConfig::default().with_radius(f64::NAN),
            PlanetConfig::default().with_voxel_resolution(-1.0),
            PlanetConfig::default().with_chunk_size(0),
            PlanetConfig::default().with_shell_thickness(0.0),
            PlanetConfig::default().with_surface_offset(-2.0),
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(PlanetError::InvalidConfig { .. })),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let err = PlanetConfig::from_toml_str("[generation]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            PlanetError::InvalidConfig { field: "generation.batch_size", .. }
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = PlanetConfig::from_toml_str("radius = \"big\"").unwrap_err();
        assert!(matches!(err, PlanetError::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PlanetConfig::load("/definitely/not/here/planet.toml").unwrap_err();
        assert!(matches!(err, PlanetError::ConfigIo { .. }));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = PlanetConfig::default().with_seed(5).with_radius(64.0);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(PlanetConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_default_config_roundtrip() {
        let config = PlanetConfig::default();
        assert!(config.seed.value() > i64::MAX as u64);

        let text = toml::to_string(&config).unwrap();
        assert_eq!(PlanetConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_negative_seed_keeps_bit_pattern() {
        let config = PlanetConfig::from_toml_str("seed = -1").unwrap();
        assert_eq!(config.seed, WorldSeed::new(u64::MAX));
    }
}
