//! # Simplex Noise
//!
//! Deterministic 3D coherent noise for planet terrain.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this implementation will produce
//! **exactly** the same values on any platform, any time. The tables are
//! built once when a generator is created and never mutated afterwards,
//! so a generator can be shared freely between worker threads.

use serde::{Deserialize, Serialize};

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
///
/// TOML integers are signed, so the seed is stored in config files as the
/// `i64` with the same bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., one noise layer).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

impl From<u64> for WorldSeed {
    fn from(seed: u64) -> Self {
        Self(seed)
    }
}

impl From<i64> for WorldSeed {
    fn from(bits: i64) -> Self {
        Self(bits as u64)
    }
}

impl From<WorldSeed> for i64 {
    fn from(seed: WorldSeed) -> Self {
        seed.0 as i64
    }
}

/// Gradient directions for 3D simplex noise: the 12 edge midpoints of a cube.
const GRAD3: [[i8; 3]; 12] = [
    [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
    [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
    [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
];

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64. A zero state would stay
        // zero forever, so the low bit is forced on.
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state as usize) % (i + 1);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> usize {
        self.perm[index & 511] as usize
    }

    /// Hashes a lattice corner to a gradient.
    #[inline]
    fn gradient(&self, i: usize, j: usize, k: usize) -> [i8; 3] {
        GRAD3[self.get(i + self.get(j + self.get(k))) % 12]
    }
}

/// 3D Simplex noise generator.
///
/// Produces smooth, continuous noise values roughly in the range [-1, 1].
///
/// # Example
///
/// ```rust
/// use voxel_planet::noise::{SimplexNoise, WorldSeed};
///
/// let noise = SimplexNoise::new(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.3, -12.0);
/// assert!(value.abs() <= 1.1);
/// ```
pub struct SimplexNoise {
    /// The permutation table.
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for the 3D simplex grid.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for the 3D simplex grid.
    const G3: f64 = 1.0 / 6.0;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 3D simplex noise at the given coordinates.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        // Skew input space to find the containing simplex cell
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = f64::from(i + j + k) * Self::G3;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);
        let z0 = z - (f64::from(k) - unskew);

        // Which of the six tetrahedra are we in?
        let ((i1, j1, k1), (i2, j2, k2)) = if x0 >= y0 {
            if y0 >= z0 {
                ((1, 0, 0), (1, 1, 0))
            } else if x0 >= z0 {
                ((1, 0, 0), (1, 0, 1))
            } else {
                ((0, 0, 1), (1, 0, 1))
            }
        } else if y0 < z0 {
            ((0, 0, 1), (0, 1, 1))
        } else if x0 < z0 {
            ((0, 1, 0), (0, 1, 1))
        } else {
            ((0, 1, 0), (1, 1, 0))
        };

        let corners = [
            (x0, y0, z0, 0, 0, 0),
            (
                x0 - i1 as f64 + Self::G3,
                y0 - j1 as f64 + Self::G3,
                z0 - k1 as f64 + Self::G3,
                i1,
                j1,
                k1,
            ),
            (
                x0 - i2 as f64 + 2.0 * Self::G3,
                y0 - j2 as f64 + 2.0 * Self::G3,
                z0 - k2 as f64 + 2.0 * Self::G3,
                i2,
                j2,
                k2,
            ),
            (
                x0 - 1.0 + 3.0 * Self::G3,
                y0 - 1.0 + 3.0 * Self::G3,
                z0 - 1.0 + 3.0 * Self::G3,
                1,
                1,
                1,
            ),
        ];

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;

        let total: f64 = corners
            .iter()
            .map(|&(cx, cy, cz, di, dj, dk)| {
                let grad = self.perm_table.gradient(ii + di, jj + dj, kk + dk);
                Self::contribution(cx, cy, cz, grad)
            })
            .sum();

        // The magic number 32.0 normalizes the output
        32.0 * total
    }

    /// Calculates the contribution from one corner of the simplex.
    #[inline]
    fn contribution(x: f64, y: f64, z: f64, grad: [i8; 3]) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            0.0
        } else {
            let t2 = t * t;
            t2 * t2
                * (x * f64::from(grad[0]) + y * f64::from(grad[1]) + z * f64::from(grad[2]))
        }
    }

    /// Generates octaved (fractal) noise.
    ///
    /// With a single octave this is exactly [`SimplexNoise::sample`].
    ///
    /// # Arguments
    ///
    /// * `x`, `y`, `z` - Coordinates
    /// * `octaves` - Number of noise layers
    /// * `persistence` - Amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    #[must_use]
    pub fn octaved(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        self.fractal(x, y, z, octaves, persistence, lacunarity, |n| n)
    }

    /// Generates ridged noise (good for mountain ranges).
    ///
    /// Each octave contributes `1 - |noise|`, so the result lies in [0, 1]
    /// with sharp crests where the underlying noise crosses zero.
    #[must_use]
    pub fn ridged(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        self.fractal(x, y, z, octaves, persistence, lacunarity, |n| 1.0 - n.abs())
    }

    #[allow(clippy::too_many_arguments)]
    fn fractal(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
        shape: impl Fn(f64) -> f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += shape(self.sample(x * frequency, y * frequency, z * frequency)) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}
