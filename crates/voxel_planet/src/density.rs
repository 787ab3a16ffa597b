//! # Density Field
//!
//! The scalar field the mesher extracts: negative inside solid rock,
//! positive in air, zero on the surface. Only the sign decides what is
//! solid; the magnitude only moves the interpolated crossing point.
//!
//! ```text
//!   density(p) = (|p| - (radius + offset))      spherical base
//!              + terrain(p)                     layered simplex noise
//!              + overlay(quantize(p))           brush edits
//! ```
//!
//! Outside the shell `| |p| - radius | > shell_thickness` the field is
//! constant air, so chunks far from the surface mesh to nothing.

use glam::DVec3;

use crate::config::{NoiseLayer, PlanetConfig, TerrainConfig};
use crate::material::Material;
use crate::noise::{SimplexNoise, WorldSeed};
use crate::overlay::EditOverlay;

/// Density returned outside the terrain shell.
pub const AIR_DENSITY: f64 = 1.0;

/// Anything that can be sampled as a density field.
///
/// Implementations must be pure: the same point always yields the same
/// value until the owner mutates the field between generation passes.
pub trait DensityField: Send + Sync {
    /// Signed density at `point`.
    fn density(&self, point: DVec3) -> f64;
}

impl<F> DensityField for F
where
    F: Fn(DVec3) -> f64 + Send + Sync,
{
    fn density(&self, point: DVec3) -> f64 {
        self(point)
    }
}

/// Layered terrain noise.
pub struct TerrainNoise {
    config: TerrainConfig,
    continent: SimplexNoise,
    ridge: SimplexNoise,
    detail: SimplexNoise,
    micro: SimplexNoise,
    biome: SimplexNoise,
}

impl TerrainNoise {
    /// Lacunarity and persistence for layers with more than one octave.
    const LACUNARITY: f64 = 2.0;
    const PERSISTENCE: f64 = 0.5;

    /// Builds every layer from its own derived seed.
    #[must_use]
    pub fn new(seed: WorldSeed, config: TerrainConfig) -> Self {
        Self {
            config,
            continent: SimplexNoise::new(seed.derive(1)),
            ridge: SimplexNoise::new(seed.derive(2)),
            detail: SimplexNoise::new(seed.derive(3)),
            micro: SimplexNoise::new(seed.derive(4)),
            biome: SimplexNoise::new(seed.derive(5)),
        }
    }

    /// Layer settings.
    #[must_use]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Sum of the four shape layers. Positive values carve the surface
    /// inward, so the terrain elevation is the negation.
    #[must_use]
    pub fn shape(&self, p: DVec3) -> f64 {
        let c = &self.config;
        Self::smooth(&self.continent, c.continent, p)
            + Self::ridged(&self.ridge, c.ridge, p)
            + Self::smooth(&self.detail, c.detail, p)
            + Self::smooth(&self.micro, c.micro, p)
    }

    /// Terrain elevation above the mean surface at `p`.
    #[must_use]
    pub fn elevation(&self, p: DVec3) -> f64 {
        -self.shape(p)
    }

    /// Terrain contribution to the density: the shape plus a weighted
    /// elevation-band offset, jittered by the biome layer.
    #[must_use]
    pub fn value(&self, p: DVec3) -> f64 {
        let shape = self.shape(p);
        let band = Material::from_elevation(-shape).density_offset();
        let biome = Self::smooth(&self.biome, self.config.biome, p);
        shape + (band + biome) * self.config.material_weight
    }

    #[inline]
    fn smooth(noise: &SimplexNoise, layer: NoiseLayer, p: DVec3) -> f64 {
        if layer.amplitude == 0.0 {
            return 0.0;
        }
        let q = p * layer.frequency;
        noise.octaved(q.x, q.y, q.z, layer.octaves, Self::PERSISTENCE, Self::LACUNARITY)
            * layer.amplitude
    }

    #[inline]
    fn ridged(noise: &SimplexNoise, layer: NoiseLayer, p: DVec3) -> f64 {
        if layer.amplitude == 0.0 {
            return 0.0;
        }
        let q = p * layer.frequency;
        noise.ridged(q.x, q.y, q.z, layer.octaves, Self::PERSISTENCE, Self::LACUNARITY)
            * layer.amplitude
    }
}

/// The full planet field: shell constraint, terrain and edit overlay.
pub struct PlanetDensity {
    terrain: TerrainNoise,
    overlay: EditOverlay,
    radius: f64,
    shell_thickness: f64,
    surface_offset: f64,
}

impl PlanetDensity {
    /// Builds the field for a validated config, with an empty overlay.
    #[must_use]
    pub fn new(config: &PlanetConfig) -> Self {
        Self {
            terrain: TerrainNoise::new(config.seed, config.terrain.clone()),
            overlay: EditOverlay::new(config.voxel_resolution),
            radius: config.radius,
            shell_thickness: config.shell_thickness,
            surface_offset: config.surface_offset,
        }
    }

    /// Terrain layers.
    #[must_use]
    pub fn terrain(&self) -> &TerrainNoise {
        &self.terrain
    }

    /// Accumulated edits.
    #[must_use]
    pub fn overlay(&self) -> &EditOverlay {
        &self.overlay
    }

    /// Mutable access to the edits. Only valid between generation passes,
    /// which the borrow checker enforces.
    pub fn overlay_mut(&mut self) -> &mut EditOverlay {
        &mut self.overlay
    }

    /// True if `point` lies inside the terrain shell.
    #[must_use]
    pub fn in_shell(&self, point: DVec3) -> bool {
        (point.length() - self.radius).abs() <= self.shell_thickness
    }

    /// Density with the overlay ignored.
    #[must_use]
    pub fn base_density(&self, point: DVec3) -> f64 {
        let distance = point.length();
        if (distance - self.radius).abs() > self.shell_thickness {
            return AIR_DENSITY;
        }
        distance - (self.radius + self.surface_offset) + self.terrain.value(point)
    }
}

impl DensityField for PlanetDensity {
    fn density(&self, point: DVec3) -> f64 {
        // NaN positions fall through the shell test and stay NaN.
        if (point.length() - self.radius).abs() > self.shell_thickness {
            return AIR_DENSITY;
        }
        self.base_density(point) + self.overlay.sample(point)
    }
}
