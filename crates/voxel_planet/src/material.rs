//! # Surface Materials
//!
//! Elevation bands shared by the density field (as a small offset) and by
//! vertex colouring (as an RGB lookup).

use glam::DVec3;

/// Compact material tag carried per sample and per mesh group.
pub type MaterialId = u8;

/// Surface material bands, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Material {
    /// Deep basins.
    Water = 0,
    /// Coastline.
    Sand = 1,
    /// Plains.
    Grass = 2,
    /// Mountains.
    Stone = 3,
    /// Peaks.
    Snow = 4,
}

impl Material {
    /// All materials in band order.
    pub const ALL: [Self; 5] = [Self::Water, Self::Sand, Self::Grass, Self::Stone, Self::Snow];

    /// Classifies an elevation (world units above the mean surface).
    #[must_use]
    pub fn from_elevation(elevation: f64) -> Self {
        if elevation < -8.0 {
            Self::Water
        } else if elevation < -2.0 {
            Self::Sand
        } else if elevation < 15.0 {
            Self::Grass
        } else if elevation < 35.0 {
            Self::Stone
        } else {
            Self::Snow
        }
    }

    /// Density offset applied by this band before weighting.
    #[must_use]
    pub const fn density_offset(self) -> f64 {
        match self {
            Self::Water => -100.0,
            Self::Sand => -50.0,
            Self::Grass => 0.0,
            Self::Stone => 50.0,
            Self::Snow => 100.0,
        }
    }

    /// Packed `0xRRGGBB` colour.
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::Water => 0x001a_4d7f,
            Self::Sand => 0x00d4_af37,
            Self::Grass => 0x006b_a83f,
            Self::Stone => 0x0088_8888,
            Self::Snow => 0x00ff_ffff,
        }
    }

    /// Colour as normalized RGB.
    #[must_use]
    pub fn rgb(self) -> [f32; 3] {
        let c = self.color();
        [
            ((c >> 16) & 255) as f32 / 255.0,
            ((c >> 8) & 255) as f32 / 255.0,
            (c & 255) as f32 / 255.0,
        ]
    }

    /// Tag used in sample blocks and mesh groups.
    #[inline]
    #[must_use]
    pub const fn id(self) -> MaterialId {
        self as MaterialId
    }

    /// Converts from a tag.
    #[must_use]
    pub const fn from_id(id: MaterialId) -> Option<Self> {
        match id {
            0 => Some(Self::Water),
            1 => Some(Self::Sand),
            2 => Some(Self::Grass),
            3 => Some(Self::Stone),
            4 => Some(Self::Snow),
            _ => None,
        }
    }
}

/// Maps a world position to a surface material.
pub trait MaterialLookup: Send + Sync {
    /// Material at `point`.
    fn material_at(&self, point: DVec3) -> Material;
}

impl<F> MaterialLookup for F
where
    F: Fn(DVec3) -> Material + Send + Sync,
{
    fn material_at(&self, point: DVec3) -> Material {
        self(point)
    }
}

/// Classifies by altitude above a reference sphere around the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AltitudeBands {
    surface_radius: f64,
}

impl AltitudeBands {
    /// Bands measured from a sphere of `surface_radius`.
    #[must_use]
    pub const fn new(surface_radius: f64) -> Self {
        Self { surface_radius }
    }

    /// Radius of the reference sphere.
    #[must_use]
    pub const fn surface_radius(&self) -> f64 {
        self.surface_radius
    }
}

impl MaterialLookup for AltitudeBands {
    fn material_at(&self, point: DVec3) -> Material {
        Material::from_elevation(point.length() - self.surface_radius)
    }
}

/// Classifies by distance from the origin against fixed radii, ignoring
/// the planet size. Suits planets whose surface lies within 80 units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialBands {
    limits: [f64; 4],
}

impl RadialBands {
    /// Bands at radii 20, 40, 60 and 80.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limits([20.0, 40.0, 60.0, 80.0])
    }

    /// Water below `limits[0]`, sand below `limits[1]` and so on, snow
    /// beyond the last limit.
    #[must_use]
    pub const fn with_limits(limits: [f64; 4]) -> Self {
        Self { limits }
    }
}

impl Default for RadialBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialLookup for RadialBands {
    fn material_at(&self, point: DVec3) -> Material {
        let distance = point.length();
        self.limits
            .iter()
            .position(|&limit| distance < limit)
            .map_or(Material::Snow, |band| Material::ALL[band])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_bands() {
        assert_eq!(Material::from_elevation(-50.0), Material::Water);
        assert_eq!(Material::from_elevation(-8.0), Material::Sand);
        assert_eq!(Material::from_elevation(-2.0), Material::Grass);
        assert_eq!(Material::from_elevation(14.9), Material::Grass);
        assert_eq!(Material::from_elevation(15.0), Material::Stone);
        assert_eq!(Material::from_elevation(35.0), Material::Snow);
    }

    #[test]
    fn test_id_roundtrip() {
        for material in Material::ALL {
            assert_eq!(Material::from_id(material.id()), Some(material));
        }
        assert_eq!(Material::from_id(200), None);
    }

    #[test]
    fn test_rgb() {
        assert_eq!(Material::Snow.rgb(), [1.0, 1.0, 1.0]);
        let [r, g, b] = Material::Water.rgb();
        assert!((r - 26.0 / 255.0).abs() < 1e-6);
        assert!((g - 77.0 / 255.0).abs() < 1e-6);
        assert!((b - 127.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_altitude_bands() {
        let bands = AltitudeBands::new(100.0);
        assert_eq!(bands.material_at(DVec3::new(80.0, 0.0, 0.0)), Material::Water);
        assert_eq!(bands.material_at(DVec3::new(0.0, 105.0, 0.0)), Material::Grass);
        assert_eq!(bands.material_at(DVec3::new(0.0, 0.0, -150.0)), Material::Snow);
    }

    #[test]
    fn test_radial_bands() {
        let bands = RadialBands::new();
        assert_eq!(bands.material_at(DVec3::new(19.9, 0.0, 0.0)), Material::Water);
        assert_eq!(bands.material_at(DVec3::new(0.0, 20.0, 0.0)), Material::Sand);
        assert_eq!(bands.material_at(DVec3::new(0.0, 0.0, -45.0)), Material::Grass);
        assert_eq!(bands.material_at(DVec3::new(60.0, 0.0, 0.0)), Material::Stone);
        assert_eq!(bands.material_at(DVec3::new(0.0, 80.0, 0.0)), Material::Snow);

        let tight = RadialBands::with_limits([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(tight.material_at(DVec3::new(2.5, 0.0, 0.0)), Material::Grass);
    }
}
