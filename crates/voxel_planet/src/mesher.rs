//! # Surface Nets Mesher
//!
//! Extracts a triangle mesh from a regular block of scalar samples.
//!
//! ## Algorithm
//!
//! 1. Every cell (cube of 8 neighbouring samples) whose corners disagree on
//!    the sign gets one vertex: the mean of the zero crossings along its
//!    sign-changing edges.
//! 2. Every sign-changing edge along +X, +Y or +Z emits a quad joining the
//!    vertices of the four cells around it, wound so the face normal
//!    points from the solid side toward the air side.
//!
//! A sample is solid when its value is `<= 0`. Only edges whose base point
//! lies in `[1, n - 2]` on every axis emit quads, so blocks that overlap
//! their neighbours by two samples along an axis share no face and leave
//! no gap between them.
//!
//! Output is non-indexed: three vertices per triangle, each carrying the
//! face normal. Triangles are grouped by material id in ascending order.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::error::{PlanetError, PlanetResult};
use crate::material::MaterialId;

/// Corner offsets of a cell, bit `i` of the index selecting axis `i`.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// The 12 cell edges as corner index pairs.
const EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

#[inline]
fn is_air(value: f32) -> bool {
    value > 0.0
}

fn for_each_sample(dims: BlockDims, mut f: impl FnMut(usize, usize, usize)) {
    for z in 0..dims.nz {
        for y in 0..dims.ny {
            for x in 0..dims.nx {
                f(x, y, z);
            }
        }
    }
}

/// Dimensions of a sample block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockDims {
    /// Samples along X.
    pub nx: usize,
    /// Samples along Y.
    pub ny: usize,
    /// Samples along Z.
    pub nz: usize,
}

impl BlockDims {
    /// Creates dimensions.
    #[must_use]
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// A cube with `n` samples per axis.
    #[must_use]
    pub const fn cube(n: usize) -> Self {
        Self::new(n, n, n)
    }

    /// Total sample count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// True if any axis is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear index of `(x, y, z)`, X fastest.
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.nx + z * self.nx * self.ny
    }

    /// Axis extents as an array.
    #[must_use]
    pub const fn as_array(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }
}

/// A block of scalar samples with optional per-sample materials.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarBlock {
    dims: BlockDims,
    samples: Vec<f32>,
    materials: Option<Vec<MaterialId>>,
}

impl ScalarBlock {
    /// Wraps samples laid out X fastest.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::BlockSizeMismatch`] if `samples` does not hold
    /// exactly `dims.len()` values.
    pub fn new(dims: BlockDims, samples: Vec<f32>) -> PlanetResult<Self> {
        if samples.len() != dims.len() {
            return Err(PlanetError::BlockSizeMismatch {
                expected: dims.len(),
                actual: samples.len(),
            });
        }
        Ok(Self {
            dims,
            samples,
            materials: None,
        })
    }

    /// Fills a block by evaluating `f` at every sample, X fastest.
    pub fn from_fn(dims: BlockDims, mut f: impl FnMut(usize, usize, usize) -> f32) -> Self {
        let mut samples = Vec::with_capacity(dims.len());
        for_each_sample(dims, |x, y, z| samples.push(f(x, y, z)));
        Self {
            dims,
            samples,
            materials: None,
        }
    }

    /// Fills samples and materials together, X fastest.
    pub fn from_fn_with_materials(
        dims: BlockDims,
        mut f: impl FnMut(usize, usize, usize) -> (f32, MaterialId),
    ) -> Self {
        let mut samples = Vec::with_capacity(dims.len());
        let mut materials = Vec::with_capacity(dims.len());
        for_each_sample(dims, |x, y, z| {
            let (value, material) = f(x, y, z);
            samples.push(value);
            materials.push(material);
        });
        Self {
            dims,
            samples,
            materials: Some(materials),
        }
    }

    /// Attaches per-sample materials.
    ///
    /// # Errors
    ///
    /// Returns [`PlanetError::BlockSizeMismatch`] on a length mismatch.
    pub fn with_materials(mut self, materials: Vec<MaterialId>) -> PlanetResult<Self> {
        if materials.len() != self.dims.len() {
            return Err(PlanetError::BlockSizeMismatch {
                expected: self.dims.len(),
                actual: materials.len(),
            });
        }
        self.materials = Some(materials);
        Ok(self)
    }

    /// Block dimensions.
    #[must_use]
    pub const fn dims(&self) -> BlockDims {
        self.dims
    }

    /// Raw samples.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Raw materials, if attached.
    #[must_use]
    pub fn materials(&self) -> Option<&[MaterialId]> {
        self.materials.as_deref()
    }

    /// Sample at `(x, y, z)`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.samples[self.dims.index(x, y, z)]
    }

    #[inline]
    fn material(&self, index: usize) -> MaterialId {
        self.materials.as_ref().map_or(0, |m| m[index])
    }
}

/// Per-cell vertices of a block, in unscaled grid coordinates.
///
/// Cells are addressed by their minimum corner, with the same layout as
/// the samples of the block they came from.
#[derive(Clone, Debug)]
pub struct CellVertices {
    dims: BlockDims,
    vertices: Vec<Option<Vec3>>,
}

impl CellVertices {
    /// Computes the vertex of every active cell.
    #[must_use]
    pub fn compute(block: &ScalarBlock) -> Self {
        let dims = block.dims();
        let mut vertices = vec![None; dims.len()];
        if dims.nx < 2 || dims.ny < 2 || dims.nz < 2 {
            return Self { dims, vertices };
        }

        let mut corner = [0.0f32; 8];
        for z in 0..dims.nz - 1 {
            for y in 0..dims.ny - 1 {
                for x in 0..dims.nx - 1 {
                    let mut mask = 0u8;
                    for (i, [ox, oy, oz]) in CORNERS.iter().enumerate() {
                        corner[i] = block.get(x + ox, y + oy, z + oz);
                        if is_air(corner[i]) {
                            mask |= 1 << i;
                        }
                    }
                    if mask == 0 || mask == 0xff {
                        continue;
                    }

                    let mut sum = Vec3::ZERO;
                    let mut crossings = 0u32;
                    for [i, j] in EDGES {
                        let (a, b) = (corner[i], corner[j]);
                        if is_air(a) == is_air(b) {
                            continue;
                        }
                        let t = a / (a - b);
                        let pa = Vec3::from_array(CORNERS[i].map(|c| c as f32));
                        let pb = Vec3::from_array(CORNERS[j].map(|c| c as f32));
                        sum += pa + (pb - pa) * t;
                        crossings += 1;
                    }

                    let offset = sum / crossings as f32;
                    vertices[dims.index(x, y, z)] =
                        Some(Vec3::new(x as f32, y as f32, z as f32) + offset);
                }
            }
        }

        Self { dims, vertices }
    }

    /// Vertex of the cell at `(x, y, z)`, if it is active.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<Vec3> {
        self.vertices[self.dims.index(x, y, z)]
    }

    /// Number of active cells.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_some()).count()
    }
}

/// A contiguous run of triangles sharing one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialGroup {
    /// Material of every triangle in the run.
    pub material: MaterialId,
    /// Index of the first triangle.
    pub first_triangle: usize,
    /// Number of triangles.
    pub triangle_count: usize,
}

impl MaterialGroup {
    /// Range of vertex indices covered by this group.
    #[must_use]
    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        self.first_triangle * 3..(self.first_triangle + self.triangle_count) * 3
    }
}

/// Non-indexed triangle soup produced by [`surface_nets`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Three positions per triangle, in block-local units.
    pub positions: Vec<[f32; 3]>,
    /// Face normal repeated for each vertex of its triangle.
    pub normals: Vec<[f32; 3]>,
    /// Material runs in ascending material order.
    pub groups: Vec<MaterialGroup>,
}

impl SurfaceMesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// True if no triangle was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Corners of triangle `i`.
    #[must_use]
    pub fn triangle(&self, i: usize) -> [[f32; 3]; 3] {
        [
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        ]
    }

    /// Material of triangle `i`.
    #[must_use]
    pub fn material_of(&self, i: usize) -> Option<MaterialId> {
        self.groups
            .iter()
            .find(|g| (g.first_triangle..g.first_triangle + g.triangle_count).contains(&i))
            .map(|g| g.material)
    }
}

#[derive(Default)]
struct Bucket {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
}

impl Bucket {
    fn push(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
        self.positions.extend([a.to_array(), b.to_array(), c.to_array()]);
        self.normals.extend([normal; 3]);
    }
}

/// Meshes `block`, scaling grid coordinates by `scale`.
///
/// Blocks smaller than 3 samples on any axis have no interior edge and
/// produce an empty mesh.
#[must_use]
pub fn surface_nets(block: &ScalarBlock, scale: f32) -> SurfaceMesh {
    let dims = block.dims();
    if dims.nx < 3 || dims.ny < 3 || dims.nz < 3 {
        return SurfaceMesh::default();
    }

    let cells = CellVertices::compute(block);
    let mut buckets: BTreeMap<MaterialId, Bucket> = BTreeMap::new();

    for z in 1..dims.nz - 1 {
        for y in 1..dims.ny - 1 {
            for x in 1..dims.nx - 1 {
                let base = dims.index(x, y, z);
                let value = block.samples[base];

                for axis in 0..3 {
                    let (next, quad) = match axis {
                        0 => (
                            dims.index(x + 1, y, z),
                            [
                                cells.get(x, y - 1, z - 1),
                                cells.get(x, y, z - 1),
                                cells.get(x, y, z),
                                cells.get(x, y - 1, z),
                            ],
                        ),
                        1 => (
                            dims.index(x, y + 1, z),
                            [
                                cells.get(x - 1, y, z - 1),
                                cells.get(x - 1, y, z),
                                cells.get(x, y, z),
                                cells.get(x, y, z - 1),
                            ],
                        ),
                        _ => (
                            dims.index(x, y, z + 1),
                            [
                                cells.get(x - 1, y - 1, z),
                                cells.get(x, y - 1, z),
                                cells.get(x, y, z),
                                cells.get(x - 1, y, z),
                            ],
                        ),
                    };

                    let forward_air = is_air(block.samples[next]);
                    if is_air(value) == forward_air {
                        continue;
                    }
                    let [Some(a), Some(b), Some(c), Some(d)] = quad else {
                        continue;
                    };
                    let (a, b, c, d) = (a * scale, b * scale, c * scale, d * scale);

                    let material = if forward_air {
                        block.material(base)
                    } else {
                        block.material(next)
                    };
                    let bucket = buckets.entry(material).or_default();
                    if forward_air {
                        bucket.push(a, b, c);
                        bucket.push(c, d, a);
                    } else {
                        bucket.push(c, b, a);
                        bucket.push(a, d, c);
                    }
                }
            }
        }
    }

    let mut mesh = SurfaceMesh::default();
    for (material, bucket) in buckets {
        let first_triangle = mesh.triangle_count();
        let triangle_count = bucket.positions.len() / 3;
        mesh.positions.extend(bucket.positions);
        mesh.normals.extend(bucket.normals);
        mesh.groups.push(MaterialGroup {
            material,
            first_triangle,
            triangle_count,
        });
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sphere_block(n: usize, center: f32, radius: f32) -> ScalarBlock {
        ScalarBlock::from_fn(BlockDims::cube(n), |x, y, z| {
            Vec3::new(x as f32, y as f32, z as f32).distance(Vec3::splat(center)) - radius
        })
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = ScalarBlock::new(BlockDims::cube(3), vec![0.0; 26]).unwrap_err();
        assert!(matches!(
            err,
            PlanetError::BlockSizeMismatch { expected: 27, actual: 26 }
        ));

        let block = ScalarBlock::new(BlockDims::cube(2), vec![1.0; 8]).unwrap();
        assert!(block.with_materials(vec![0; 3]).is_err());
    }

    #[test]
    fn test_uniform_blocks_are_empty() {
        let air = ScalarBlock::new(BlockDims::cube(6), vec![1.0; 216]).unwrap();
        let solid = ScalarBlock::new(BlockDims::cube(6), vec![-1.0; 216]).unwrap();

        assert!(surface_nets(&air, 1.0).is_empty());
        assert!(surface_nets(&solid, 1.0).is_empty());
        assert_eq!(CellVertices::compute(&air).active_count(), 0);
    }

    #[test]
    fn test_too_small_blocks_are_empty() {
        let block = ScalarBlock::from_fn(BlockDims::new(2, 5, 5), |x, _, _| x as f32 - 0.5);
        assert!(surface_nets(&block, 1.0).is_empty());
    }

    #[test]
    fn test_plane_vertices_interpolate_crossing() {
        // Solid below y = 2.25.
        let block = ScalarBlock::from_fn(BlockDims::cube(5), |_, y, _| y as f32 - 2.25);
        let cells = CellVertices::compute(&block);

        for z in 0..4 {
            for x in 0..4 {
                let v = cells.get(x, 2, z).unwrap();
                assert!((v.y - 2.25).abs() < 1e-5);
                assert!((v.x - (x as f32 + 0.5)).abs() < 1e-5);
                assert!((v.z - (z as f32 + 0.5)).abs() < 1e-5);
                assert!(cells.get(x, 1, z).is_none());
            }
        }
    }

    #[test]
    fn test_plane_normals_point_to_air() {
        let block = ScalarBlock::from_fn(BlockDims::cube(6), |_, y, _| y as f32 - 2.5);
        let mesh = surface_nets(&block, 2.0);

        assert!(!mesh.is_empty());
        for (position, normal) in mesh.positions.iter().zip(&mesh.normals) {
            assert!((position[1] - 5.0).abs() < 1e-4);
            assert!((normal[1] - 1.0).abs() < 1e-5, "normal {normal:?}");
        }
    }

    #[test]
    fn test_inverted_plane_flips_winding() {
        let block = ScalarBlock::from_fn(BlockDims::cube(6), |x, _, _| 2.5 - x as f32);
        let mesh = surface_nets(&block, 1.0);

        assert!(!mesh.is_empty());
        for normal in &mesh.normals {
            assert!((normal[0] + 1.0).abs() < 1e-5, "normal {normal:?}");
        }
    }

    #[test]
    fn test_interior_ownership() {
        // Crossing between x = 3 and x = 4 of a 6-wide block: one column of
        // +X edges with base x = 3 and y, z in [1, 4].
        let block = ScalarBlock::from_fn(BlockDims::cube(6), |x, _, _| x as f32 - 3.5);
        let mesh = surface_nets(&block, 1.0);
        assert_eq!(mesh.triangle_count(), 4 * 4 * 2);

        // The last edge is still owned.
        let block = ScalarBlock::from_fn(BlockDims::cube(6), |x, _, _| x as f32 - 4.5);
        assert_eq!(surface_nets(&block, 1.0).triangle_count(), 4 * 4 * 2);

        // The first edge belongs to the previous block.
        let block = ScalarBlock::from_fn(BlockDims::cube(6), |x, _, _| x as f32 - 0.5);
        assert!(surface_nets(&block, 1.0).is_empty());
    }

    #[test]
    fn test_sphere_normals_face_outward() {
        let block = sphere_block(14, 6.5, 4.3);
        let mesh = surface_nets(&block, 1.0);
        let center = Vec3::splat(6.5);

        assert!(mesh.triangle_count() > 50);
        for i in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(i).map(Vec3::from_array);
            let n = Vec3::from_array(mesh.normals[i * 3]);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid - center) >= 0.0, "triangle {i} faces inward");
        }
    }

    #[test]
    fn test_zero_counts_as_solid() {
        let block = ScalarBlock::from_fn(BlockDims::cube(5), |_, y, _| if y <= 2 { 0.0 } else { 1.0 });
        let cells = CellVertices::compute(&block);

        let v = cells.get(1, 2, 1).unwrap();
        assert!((v.y - 2.0).abs() < 1e-6);
        assert!(cells.get(1, 1, 1).is_none());
    }

    #[test]
    fn test_random_blocks_are_sign_consistent() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let dims = BlockDims::cube(7);

        for _ in 0..20 {
            let block = ScalarBlock::from_fn(dims, |_, _, _| rng.gen_range(-1.0f32..1.0));
            let cells = CellVertices::compute(&block);

            for z in 0..6 {
                for y in 0..6 {
                    for x in 0..6 {
                        let mut solid = 0;
                        for [ox, oy, oz] in CORNERS {
                            if block.get(x + ox, y + oy, z + oz) <= 0.0 {
                                solid += 1;
                            }
                        }
                        let mixed = solid != 0 && solid != 8;
                        let vertex = cells.get(x, y, z);
                        assert_eq!(vertex.is_some(), mixed);
                        if let Some(v) = vertex {
                            let local = v - Vec3::new(x as f32, y as f32, z as f32);
                            assert!(local.min_element() >= -1e-5 && local.max_element() <= 1.0 + 1e-5);
                        }
                    }
                }
            }

            let mesh = surface_nets(&block, 1.0);
            assert_eq!(mesh.positions.len(), mesh.normals.len());
            assert_eq!(mesh.positions.len() % 3, 0);
            for n in &mesh.normals {
                let len = Vec3::from_array(*n).length();
                assert!(len < 1e-6 || (len - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_materials_come_from_solid_side_and_are_grouped() {
        let dims = BlockDims::cube(8);
        let block = sphere_block(8, 3.5, 2.2);
        let materials = (0..dims.len())
            .map(|i| if (i % dims.nx) < 4 { 3 } else { 1 })
            .collect();
        let block = block.with_materials(materials).unwrap();
        let mesh = surface_nets(&block, 1.0);

        let ids: Vec<_> = mesh.groups.iter().map(|g| g.material).collect();
        assert_eq!(ids, vec![1, 3]);

        let mut next = 0;
        for group in &mesh.groups {
            assert_eq!(group.first_triangle, next);
            next += group.triangle_count;
        }
        assert_eq!(next, mesh.triangle_count());
        assert_eq!(mesh.groups[1].vertex_range().end, mesh.vertex_count());
    }

    #[test]
    fn test_nan_samples_propagate() {
        let block = ScalarBlock::from_fn(BlockDims::cube(4), |x, _, _| {
            if x == 2 { f32::NAN } else { 1.0 }
        });
        let cells = CellVertices::compute(&block);
        assert!(cells.get(1, 1, 1).is_some_and(|v| v.is_nan()));
    }
}
