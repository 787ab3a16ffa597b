//! # Chunk System
//!
//! The planet volume is cut into a cubic lattice of chunks. Each chunk
//! samples the density field on a `(size + 2)^3` block starting at its
//! origin, so it overlaps the next chunk by two samples per axis. The
//! mesher only emits faces owned by the chunk, which makes neighbouring
//! meshes meet without gaps or duplicates.
//!
//! Sample positions are derived from global voxel indices rather than
//! from the chunk origin, so the shared samples of two neighbours are
//! bit-identical.

use glam::DVec3;

use crate::density::DensityField;
use crate::material::MaterialLookup;
use crate::mesher::{surface_nets, BlockDims, MaterialGroup, ScalarBlock, SurfaceMesh};

/// Chunk coordinate on the planet lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks).
    pub x: usize,
    /// Y coordinate (in chunks).
    pub y: usize,
    /// Z coordinate (in chunks).
    pub z: usize,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Linear index in a lattice of `n` chunks per axis.
    #[inline]
    #[must_use]
    pub const fn index(self, n: usize) -> usize {
        self.x * n * n + self.y * n + self.z
    }

    /// Inverse of [`ChunkCoord::index`].
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize, n: usize) -> Self {
        Self {
            x: index / (n * n),
            y: (index / n) % n,
            z: index % n,
        }
    }
}

/// Mesh data for one chunk, ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    surface: SurfaceMesh,
    colors: Vec<[f32; 3]>,
}

impl ChunkMesh {
    /// Underlying surface.
    #[must_use]
    pub fn surface(&self) -> &SurfaceMesh {
        &self.surface
    }

    /// Chunk-local vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.surface.positions
    }

    /// Per-vertex face normals.
    #[must_use]
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.surface.normals
    }

    /// Per-vertex RGB colours.
    #[must_use]
    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// Material runs.
    #[must_use]
    pub fn groups(&self) -> &[MaterialGroup] {
        &self.surface.groups
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.surface.vertex_count()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.surface.triangle_count()
    }

    /// Positions as raw bytes.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.surface.positions)
    }

    /// Normals as raw bytes.
    #[must_use]
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.surface.normals)
    }

    /// Colours as raw bytes.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// One cubic region of the planet and its current mesh.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: usize,
    resolution: f64,
    world_min: f64,
    origin: DVec3,
    mesh: Option<ChunkMesh>,
    revision: u64,
}

impl Chunk {
    /// Creates an unmeshed chunk of `size` voxels per axis on a lattice
    /// whose minimum corner is `world_min` on every axis.
    #[must_use]
    pub fn new(coord: ChunkCoord, size: usize, resolution: f64, world_min: f64) -> Self {
        let span = size as f64 * resolution;
        let origin = DVec3::new(
            world_min + coord.x as f64 * span,
            world_min + coord.y as f64 * span,
            world_min + coord.z as f64 * span,
        );
        Self {
            coord,
            size,
            resolution,
            world_min,
            origin,
            mesh: None,
            revision: 0,
        }
    }

    /// Lattice coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Voxels per axis, excluding padding.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// World units per voxel.
    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// World position of the minimum corner.
    #[must_use]
    pub const fn origin(&self) -> DVec3 {
        self.origin
    }

    /// World-space edge length.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.size as f64 * self.resolution
    }

    /// Axis-aligned bounds `(min, max)` of the region the chunk owns.
    #[must_use]
    pub fn bounds(&self) -> (DVec3, DVec3) {
        (self.origin, self.origin + DVec3::splat(self.span()))
    }

    /// Current mesh, if the last generation produced one.
    #[must_use]
    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh.as_ref()
    }

    /// True if the chunk holds a mesh.
    #[must_use]
    pub fn is_meshed(&self) -> bool {
        self.mesh.is_some()
    }

    /// Number of times the mesh has been generated.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// World position of padded sample `(x, y, z)`.
    #[inline]
    #[must_use]
    pub fn sample_position(&self, x: usize, y: usize, z: usize) -> DVec3 {
        let axis = |c: usize, i: usize| self.world_min + (c * self.size + i) as f64 * self.resolution;
        DVec3::new(
            axis(self.coord.x, x),
            axis(self.coord.y, y),
            axis(self.coord.z, z),
        )
    }

    /// Samples the padded density block with per-sample materials.
    pub fn sample_block<F, M>(&self, field: &F, materials: &M) -> ScalarBlock
    where
        F: DensityField + ?Sized,
        M: MaterialLookup + ?Sized,
    {
        ScalarBlock::from_fn_with_materials(BlockDims::cube(self.size + 2), |x, y, z| {
            let p = self.sample_position(x, y, z);
            (field.density(p) as f32, materials.material_at(p).id())
        })
    }

    /// Samples the field and replaces the mesh. Returns the new mesh, or
    /// `None` if the chunk contains no surface.
    pub fn generate_mesh<F, M>(&mut self, field: &F, materials: &M) -> Option<&ChunkMesh>
    where
        F: DensityField + ?Sized,
        M: MaterialLookup + ?Sized,
    {
        let block = self.sample_block(field, materials);
        let surface = surface_nets(&block, self.resolution as f32);
        self.revision += 1;

        if surface.is_empty() {
            self.mesh = None;
            return None;
        }

        let origin = self.origin;
        let colors = surface
            .positions
            .iter()
            .map(|p| {
                let world = origin + DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]));
                materials.material_at(world).rgb()
            })
            .collect();

        self.mesh = Some(ChunkMesh { surface, colors });
        self.mesh.as_ref()
    }

    /// Drops the mesh.
    pub fn clear_mesh(&mut self) {
        self.mesh = None;
    }
}
