//! # Edit Overlay
//!
//! Sparse additive density deltas on the voxel lattice. Brushes accumulate
//! into the overlay; the density field adds the delta stored at the
//! nearest lattice point of every sample.
//!
//! Keys are integer lattice coordinates, so repeated edits land on exactly
//! the same entries regardless of floating point drift in the brush loop.

use std::collections::HashMap;

use glam::{DVec3, IVec3};

use crate::error::{PlanetError, PlanetResult};

/// Integer lattice coordinate of one voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoxelKey(pub IVec3);

impl VoxelKey {
    /// Creates a key from lattice coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    /// Nearest lattice point to `point`. Ties round toward +infinity on
    /// every axis.
    #[must_use]
    pub fn quantize(point: DVec3, resolution: f64) -> Self {
        Self((point / resolution + DVec3::splat(0.5)).floor().as_ivec3())
    }

    /// World position of this lattice point.
    #[must_use]
    pub fn world_position(self, resolution: f64) -> DVec3 {
        self.0.as_dvec3() * resolution
    }
}

impl From<IVec3> for VoxelKey {
    fn from(v: IVec3) -> Self {
        Self(v)
    }
}

/// A spherical additive edit.
///
/// `strength` is an amount of material: positive fills, negative digs.
/// Every lattice point within `radius` of `center` receives the density
/// delta `-strength * (1 - (d / radius)^2)`, since solid is negative.
/// The stored value is therefore the negation of a brush that adds
/// `strength` to the density directly; callers porting edits from such a
/// convention flip the sign of `strength`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    center: DVec3,
    strength: f64,
    radius: f64,
}

impl Brush {
    /// Validates and creates a brush.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidBrush`] if the center or strength is
    /// not finite, or the radius is not finite and positive.
    pub fn new(center: DVec3, strength: f64, radius: f64) -> PlanetResult<Self> {
        if !center.is_finite() {
            return Err(PlanetError::InvalidBrush(format!(
                "center must be finite, got {center}"
            )));
        }
        if !strength.is_finite() {
            return Err(PlanetError::InvalidBrush(format!(
                "strength must be finite, got {strength}"
            )));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PlanetError::InvalidBrush(format!(
                "radius must be finite and positive, got {radius}"
            )));
        }
        Ok(Self {
            center,
            strength,
            radius,
        })
    }

    /// Brush center.
    #[must_use]
    pub const fn center(&self) -> DVec3 {
        self.center
    }

    /// Material added at the center.
    #[must_use]
    pub const fn strength(&self) -> f64 {
        self.strength
    }

    /// Radius of influence.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Falloff weight at `point`, or `None` outside the radius.
    #[must_use]
    pub fn falloff(&self, point: DVec3) -> Option<f64> {
        let d2 = point.distance_squared(self.center);
        let r2 = self.radius * self.radius;
        (d2 <= r2).then(|| 1.0 - d2 / r2)
    }

    /// Density delta at `point`, or `None` outside the radius.
    #[must_use]
    pub fn delta_at(&self, point: DVec3) -> Option<f64> {
        self.falloff(point).map(|w| -self.strength * w)
    }

    /// Inclusive lattice range enclosing the brush sphere, clamped to the
    /// representable key range.
    #[must_use]
    pub fn key_bounds(&self, resolution: f64) -> (IVec3, IVec3) {
        let (min, max) = self.key_bounds_f64(resolution);
        (min.as_ivec3(), max.as_ivec3())
    }

    /// Number of lattice points in [`Brush::key_bounds`].
    #[must_use]
    pub fn key_count(&self, resolution: f64) -> f64 {
        let (min, max) = self.key_bounds_f64(resolution);
        (max - min + DVec3::ONE).element_product()
    }

    fn key_bounds_f64(&self, resolution: f64) -> (DVec3, DVec3) {
        let r = DVec3::splat(self.radius);
        let lo = DVec3::splat(f64::from(i32::MIN));
        let hi = DVec3::splat(f64::from(i32::MAX));
        let min = ((self.center - r) / resolution).floor().clamp(lo, hi);
        let max = ((self.center + r) / resolution).ceil().clamp(lo, hi);
        (min, max)
    }

    /// True if the brush sphere touches the box `[min, max]`.
    #[must_use]
    pub fn intersects_aabb(&self, min: DVec3, max: DVec3) -> bool {
        let closest = self.center.clamp(min, max);
        closest.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// Accumulated edit deltas keyed by lattice point.
#[derive(Clone, Debug, Default)]
pub struct EditOverlay {
    resolution: f64,
    deltas: HashMap<VoxelKey, f64>,
}

impl EditOverlay {
    /// Largest lattice box a single brush may visit.
    pub const MAX_BRUSH_KEYS: f64 = 16_777_216.0;

    /// Empty overlay on a lattice of spacing `resolution`.
    #[must_use]
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            deltas: HashMap::new(),
        }
    }

    /// Lattice spacing.
    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Delta stored at `key`, zero if absent.
    #[must_use]
    pub fn get(&self, key: VoxelKey) -> f64 {
        self.deltas.get(&key).copied().unwrap_or(0.0)
    }

    /// Delta at the lattice point nearest `point`.
    #[must_use]
    pub fn sample(&self, point: DVec3) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.get(VoxelKey::quantize(point, self.resolution))
    }

    /// Adds `delta` to the entry at `key`.
    pub fn accumulate(&mut self, key: VoxelKey, delta: f64) {
        *self.deltas.entry(key).or_insert(0.0) += delta;
    }

    /// Applies a brush, returning the number of lattice points touched.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidBrush`] if the brush would visit more
    /// than [`EditOverlay::MAX_BRUSH_KEYS`] lattice points. The overlay is
    /// unchanged in that case.
    pub fn apply_brush(&mut self, brush: &Brush) -> PlanetResult<usize> {
        let keys = brush.key_count(self.resolution);
        if keys > Self::MAX_BRUSH_KEYS {
            return Err(PlanetError::InvalidBrush(format!(
                "radius {} spans {keys:.0} voxels, more than {}",
                brush.radius(),
                Self::MAX_BRUSH_KEYS
            )));
        }

        let (min, max) = brush.key_bounds(self.resolution);
        let mut touched = 0;

        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let key = VoxelKey::new(x, y, z);
                    if let Some(delta) = brush.delta_at(key.world_position(self.resolution)) {
                        self.accumulate(key, delta);
                        touched += 1;
                    }
                }
            }
        }

        Ok(touched)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// True if no edit has been applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Drops every edit.
    pub fn clear(&mut self) {
        self.deltas.clear();
    }

    /// Iterates stored entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (VoxelKey, f64)> + '_ {
        self.deltas.iter().map(|(k, v)| (*k, *v))
    }
}
