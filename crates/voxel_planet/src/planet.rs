//! # Voxel Planet
//!
//! Owns the chunk lattice, the density field and the material lookup, and
//! drives generation and edits.
//!
//! ## Lattice
//!
//! The lattice is a cube of `n^3` chunks starting at `world_min = -extent`
//! with `n = ceil(2 * extent / chunk_span)`. Chunks are stored in index
//! order `x * n^2 + y * n + z`, which is also the generation order.
//!
//! ## Generation
//!
//! | Path                 | Scheduling                                   |
//! |----------------------|----------------------------------------------|
//! | `generate`           | every chunk, on the calling thread           |
//! | `generate_parallel`  | every chunk, across the rayon pool           |
//! | `generate_batch`     | one batch per call, driven by the host frame |
//! | `generate_async`     | batches, yielding to the runtime in between  |
//!
//! Every path borrows the density field immutably for the whole pass, so
//! the edit overlay cannot change under a running generation.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use glam::DVec3;
use rayon::prelude::*;

use crate::chunk::{Chunk, ChunkCoord};
use crate::config::PlanetConfig;
use crate::density::{DensityField, PlanetDensity};
use crate::error::{PlanetError, PlanetResult};
use crate::material::{AltitudeBands, MaterialLookup};
use crate::overlay::{Brush, EditOverlay};

/// Progress of a generation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationProgress {
    /// Chunks generated so far.
    pub processed: usize,
    /// Chunks in the pass.
    pub total: usize,
}

impl GenerationProgress {
    /// Completed fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    /// True once every chunk has been generated.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// How a progressive generation pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Every chunk was generated.
    Completed,
    /// The pass was cancelled at a batch boundary.
    Cancelled {
        /// Chunks generated before cancellation.
        processed: usize,
    },
}

/// Shared flag that stops progressive generation at the next batch
/// boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once [`CancelToken::cancel`] has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Position of a frame-driven generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationCursor {
    next: usize,
    batch_size: usize,
}

impl GenerationCursor {
    /// Starts a pass at the first chunk.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidConfig`] if `batch_size` is zero.
    pub fn new(batch_size: usize) -> PlanetResult<Self> {
        if batch_size == 0 {
            return Err(PlanetError::config("batch_size", "must be at least 1"));
        }
        Ok(Self { next: 0, batch_size })
    }

    /// Chunks per batch.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Chunks generated so far.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.next
    }

    /// Rewinds to the first chunk.
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

/// Result of a brush edit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditReport {
    /// Overlay entries the brush touched.
    pub voxels_modified: usize,
    /// Indices of the regenerated chunks, ascending.
    pub chunks_regenerated: Vec<usize>,
}

/// Aggregate counts over the lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanetStats {
    /// Chunks in the lattice.
    pub chunks: usize,
    /// Chunks currently holding a mesh.
    pub meshed_chunks: usize,
    /// Triangles over all meshes.
    pub triangles: usize,
    /// Entries in the edit overlay.
    pub overlay_entries: usize,
}

/// A spherical voxel planet.
pub struct VoxelPlanet {
    config: PlanetConfig,
    field: PlanetDensity,
    materials: Box<dyn MaterialLookup>,
    chunks: Vec<Chunk>,
    chunks_per_axis: usize,
    world_min: f64,
}

impl VoxelPlanet {
    /// Lays out the chunk lattice. No chunk is meshed yet.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidConfig`] if the config fails
    /// validation.
    pub fn new(config: PlanetConfig) -> PlanetResult<Self> {
        config.validate()?;

        let extent = config.extent();
        let span = config.chunk_span();
        let chunks_per_axis = ((2.0 * extent / span).ceil() as usize).max(1);
        let world_min = -extent;

        let total = chunks_per_axis
            .checked_pow(3)
            .ok_or_else(|| PlanetError::config("chunk_size", "lattice is too large"))?;
        let chunks = (0..total)
            .map(|i| {
                Chunk::new(
                    ChunkCoord::from_index(i, chunks_per_axis),
                    config.chunk_size,
                    config.voxel_resolution,
                    world_min,
                )
            })
            .collect();

        tracing::info!(
            "Planet laid out: radius {}, {}^3 = {} chunks of {} voxels, seed {:#x}",
            config.radius,
            chunks_per_axis,
            total,
            config.chunk_size,
            config.seed.value()
        );

        Ok(Self {
            field: PlanetDensity::new(&config),
            materials: Box::new(AltitudeBands::new(config.radius + config.surface_offset)),
            config,
            chunks,
            chunks_per_axis,
            world_min,
        })
    }

    /// Replaces the material lookup used for sample materials and vertex
    /// colours. Existing meshes keep their colours until regenerated.
    #[must_use]
    pub fn with_material_lookup(mut self, lookup: impl MaterialLookup + 'static) -> Self {
        self.materials = Box::new(lookup);
        self
    }

    /// Configuration the planet was built from.
    #[must_use]
    pub fn config(&self) -> &PlanetConfig {
        &self.config
    }

    /// Chunks per lattice axis.
    #[must_use]
    pub const fn chunks_per_axis(&self) -> usize {
        self.chunks_per_axis
    }

    /// Total chunk count.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Lower lattice bound on every axis.
    #[must_use]
    pub const fn world_min(&self) -> f64 {
        self.world_min
    }

    /// Upper lattice bound on every axis (exclusive for lookups).
    #[must_use]
    pub fn world_max(&self) -> f64 {
        self.world_min + self.chunks_per_axis as f64 * self.config.chunk_span()
    }

    /// All chunks in index order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk at a linear index.
    #[must_use]
    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Chunk at a lattice coordinate.
    #[must_use]
    pub fn chunk_at_coord(&self, coord: ChunkCoord) -> Option<&Chunk> {
        let n = self.chunks_per_axis;
        if coord.x >= n || coord.y >= n || coord.z >= n {
            return None;
        }
        self.chunks.get(coord.index(n))
    }

    /// The density field, including edits.
    #[must_use]
    pub fn density_field(&self) -> &PlanetDensity {
        &self.field
    }

    /// Density at `point`.
    #[must_use]
    pub fn density_at(&self, point: DVec3) -> f64 {
        self.field.density(point)
    }

    /// Accumulated edits.
    #[must_use]
    pub fn overlay(&self) -> &EditOverlay {
        self.field.overlay()
    }

    /// Generates every chunk on the calling thread.
    pub fn generate(&mut self) {
        let started = Instant::now();
        for chunk in &mut self.chunks {
            chunk.generate_mesh(&self.field, &*self.materials);
        }
        self.log_generated(started);
    }

    /// Generates every chunk across the rayon pool.
    pub fn generate_parallel(&mut self) {
        let started = Instant::now();
        let field = &self.field;
        let materials = &*self.materials;
        self.chunks.par_iter_mut().for_each(|chunk| {
            chunk.generate_mesh(field, materials);
        });
        self.log_generated(started);
    }

    /// Generates the next batch of `cursor` and advances it. Calling again
    /// after completion is a no-op that reports full progress.
    pub fn generate_batch(&mut self, cursor: &mut GenerationCursor) -> GenerationProgress {
        let total = self.chunks.len();
        let start = cursor.next.min(total);
        let end = start.saturating_add(cursor.batch_size).min(total);

        for chunk in &mut self.chunks[start..end] {
            chunk.generate_mesh(&self.field, &*self.materials);
        }
        cursor.next = end;

        tracing::debug!("Generated chunks {}..{} of {}", start, end, total);
        GenerationProgress {
            processed: end,
            total,
        }
    }

    /// Generates every chunk in batches of `batch_size`, yielding to the
    /// async runtime between batches.
    ///
    /// `observer` receives the progress after every batch; the last call
    /// reports a fraction of exactly 1.0. A panicking observer is logged
    /// and ignored. `cancel` is checked before every batch.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidConfig`] if `batch_size` is zero.
    pub async fn generate_async<O>(
        &mut self,
        batch_size: usize,
        mut observer: O,
        cancel: &CancelToken,
    ) -> PlanetResult<GenerationOutcome>
    where
        O: FnMut(GenerationProgress),
    {
        let mut cursor = GenerationCursor::new(batch_size)?;
        let started = Instant::now();

        loop {
            if cancel.is_cancelled() {
                tracing::info!(
                    "Generation cancelled after {} of {} chunks",
                    cursor.processed(),
                    self.chunks.len()
                );
                return Ok(GenerationOutcome::Cancelled {
                    processed: cursor.processed(),
                });
            }

            let progress = self.generate_batch(&mut cursor);
            if catch_unwind(AssertUnwindSafe(|| observer(progress))).is_err() {
                tracing::warn!(
                    "Progress observer panicked at {}/{}; continuing",
                    progress.processed,
                    progress.total
                );
            }
            if progress.is_complete() {
                break;
            }
            tokio::task::yield_now().await;
        }

        self.log_generated(started);
        Ok(GenerationOutcome::Completed)
    }

    /// Index of the chunk whose cell contains `point`, or `None` outside
    /// `[world_min, world_max)` on any axis or for non-finite input.
    #[must_use]
    pub fn chunk_index_at(&self, point: DVec3) -> Option<usize> {
        if !point.is_finite() {
            return None;
        }
        let n = self.chunks_per_axis;
        let span = self.config.chunk_span();
        let axis = |c: f64| {
            let i = ((c - self.world_min) / span).floor();
            (i >= 0.0 && i < n as f64).then_some(i as usize)
        };
        let coord = ChunkCoord::new(axis(point.x)?, axis(point.y)?, axis(point.z)?);
        Some(coord.index(n))
    }

    /// Chunk whose cell contains `point`.
    #[must_use]
    pub fn get_chunk_at(&self, point: DVec3) -> Option<&Chunk> {
        self.chunk_index_at(point).map(|i| &self.chunks[i])
    }

    /// Chunks whose bounds intersect the brush sphere, ascending.
    #[must_use]
    pub fn affected_chunks(&self, brush: &Brush) -> Vec<usize> {
        let lattice_min = DVec3::splat(self.world_min);
        let lattice_max = DVec3::splat(self.world_max());
        if !brush.intersects_aabb(lattice_min, lattice_max) {
            return Vec::new();
        }

        let n = self.chunks_per_axis;
        let span = self.config.chunk_span();
        let last = (n - 1) as f64;
        // One extra chunk each side covers spheres that touch a face exactly.
        // Clamped in f64 so far-away centres cannot overflow the cast.
        let range = |c: f64| {
            let lo = ((c - brush.radius() - self.world_min) / span).floor() - 1.0;
            let hi = ((c + brush.radius() - self.world_min) / span).floor() + 1.0;
            (lo.clamp(0.0, last) as usize, hi.clamp(0.0, last) as usize)
        };
        let center = brush.center();
        let (x0, x1) = range(center.x);
        let (y0, y1) = range(center.y);
        let (z0, z1) = range(center.z);

        let mut affected = Vec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                for z in z0..=z1 {
                    let index = ChunkCoord::new(x, y, z).index(n);
                    let (min, max) = self.chunks[index].bounds();
                    if brush.intersects_aabb(min, max) {
                        affected.push(index);
                    }
                }
            }
        }
        affected
    }

    /// Applies a spherical brush and regenerates exactly the chunks it
    /// touches.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidBrush`] for a non-finite center or
    /// strength, a radius that is not finite and positive, or a radius
    /// too large for one edit. The planet is unchanged in that case.
    pub fn modify_density(
        &mut self,
        center: DVec3,
        strength: f64,
        radius: f64,
    ) -> PlanetResult<EditReport> {
        let brush = Brush::new(center, strength, radius)?;
        self.apply_brush(&brush)
    }

    /// [`VoxelPlanet::modify_density`] with a prepared brush.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::InvalidBrush`] if the brush covers more than
    /// [`EditOverlay::MAX_BRUSH_KEYS`] voxels. The planet is unchanged in
    /// that case.
    pub fn apply_brush(&mut self, brush: &Brush) -> PlanetResult<EditReport> {
        let voxels_modified = self.field.overlay_mut().apply_brush(brush)?;
        let affected = self.affected_chunks(brush);

        for &index in &affected {
            let chunk = &mut self.chunks[index];
            chunk.generate_mesh(&self.field, &*self.materials);
            tracing::trace!(
                "Regenerated chunk {} (revision {})",
                index,
                chunk.revision()
            );
        }

        tracing::debug!(
            "Brush at {} (strength {}, radius {}): {} voxels, {} chunks",
            brush.center(),
            brush.strength(),
            brush.radius(),
            voxels_modified,
            affected.len()
        );

        Ok(EditReport {
            voxels_modified,
            chunks_regenerated: affected,
        })
    }

    /// Aggregate counts.
    #[must_use]
    pub fn stats(&self) -> PlanetStats {
        let (meshed_chunks, triangles) = self
            .chunks
            .iter()
            .filter_map(Chunk::mesh)
            .fold((0, 0), |(m, t), mesh| (m + 1, t + mesh.triangle_count()));
        PlanetStats {
            chunks: self.chunks.len(),
            meshed_chunks,
            triangles,
            overlay_entries: self.field.overlay().len(),
        }
    }

    fn log_generated(&self, started: Instant) {
        let stats = self.stats();
        tracing::info!(
            "Generated {} chunks in {:.2?}: {} meshed, {} triangles",
            stats.chunks,
            started.elapsed(),
            stats.meshed_chunks,
            stats.triangles
        );
    }
}
