//! # Voxel Planet
//!
//! Spherical voxel terrain with smooth, editable surfaces.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and same edits always produce the same meshes
//! 2. **Chunked**: The planet is a cubic lattice of independently meshed chunks
//! 3. **Seamless**: Neighbouring chunks overlap by two samples and never share a face
//! 4. **Local edits**: A brush regenerates only the chunks its sphere touches
//!
//! ## Core Components
//!
//! - `PlanetDensity`: terrain noise inside a spherical shell, plus edits
//! - `EditOverlay`: sparse accumulated brush deltas on the voxel lattice
//! - `surface_nets`: dual isosurface extraction with material groups
//! - `Chunk`: padded sample block and its mesh
//! - `VoxelPlanet`: lattice layout, generation, lookup and edits
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//! use voxel_planet::{PlanetConfig, TerrainConfig, VoxelPlanet};
//!
//! let config = PlanetConfig {
//!     terrain: TerrainConfig::flat(),
//!     ..PlanetConfig::default()
//! }
//! .with_radius(10.0)
//! .with_shell_thickness(3.0)
//! .with_surface_offset(0.0)
//! .with_chunk_size(8);
//!
//! let mut planet = VoxelPlanet::new(config)?;
//! planet.generate();
//! assert!(planet.stats().triangles > 0);
//!
//! // Dig a hole at the north pole.
//! let report = planet.modify_density(DVec3::new(0.0, 10.0, 0.0), -4.0, 2.0)?;
//! assert!(!report.chunks_regenerated.is_empty());
//! # Ok::<(), voxel_planet::PlanetError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod density;
pub mod error;
pub mod material;
pub mod mesher;
pub mod noise;
pub mod overlay;
pub mod planet;

pub use chunk::{Chunk, ChunkCoord, ChunkMesh};
pub use config::{GenerationConfig, NoiseLayer, PlanetConfig, TerrainConfig};
pub use density::{DensityField, PlanetDensity, TerrainNoise, AIR_DENSITY};
pub use error::{PlanetError, PlanetResult};
pub use material::{AltitudeBands, Material, MaterialId, MaterialLookup, RadialBands};
pub use mesher::{surface_nets, BlockDims, CellVertices, MaterialGroup, ScalarBlock, SurfaceMesh};
pub use noise::{SimplexNoise, WorldSeed};
pub use overlay::{Brush, EditOverlay, VoxelKey};
pub use planet::{
    CancelToken, EditReport, GenerationCursor, GenerationOutcome, GenerationProgress, PlanetStats,
    VoxelPlanet,
};
