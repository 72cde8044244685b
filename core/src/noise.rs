use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Perlin2D, Simplex2D};

// Upper bound (exclusive) of the seed-derived sampling offsets
const OFFSET_RANGE: f32 = 9999.0;

// noise generator that can sample 2D points
// Output is roughly in [−1, +1].
pub trait NoiseGenerator: Send + Sync {
    fn get2(&self, x: f64, y: f64) -> f64;

    // Same sample remapped into [0, 1]
    fn get2_unit(&self, x: f64, y: f64) -> f64 {
        ((self.get2(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

// Which coherent-noise kernel the synthesis and distortion stages sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseBasis {
    #[default]
    Perlin,
    Simplex,
}

// Octave stacking shared by every kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Octaves {
    pub count: usize,
    pub persistence: f64,
}

impl Default for Octaves {
    fn default() -> Self {
        Self {
            count: 1,
            persistence: 0.5,
        }
    }
}

impl Octaves {
    // Fractal Brownian Motion: sum `count` octaves, each at double the
    // frequency and `persistence` times the amplitude of the previous one,
    // normalized by the total amplitude.
    pub fn fbm(&self, x: f64, y: f64, raw: impl Fn(f64, f64) -> f64) -> f64 {
        let mut amplitude = 1.0;
        let mut freq = 1.0;
        let mut total = 0.0;
        let mut max_amp = 0.0;

        for _ in 0..self.count.max(1) {
            total += raw(x * freq, y * freq) * amplitude;
            max_amp += amplitude;
            amplitude *= self.persistence;
            freq *= 2.0;
        }

        total / max_amp
    }
}

// Seeded permutation table of 0..256, duplicated to 512 entries so lookups
// of `perm[i + 1]` never need a modulo.
pub(crate) fn permutation(seed: u64, salt: u64) -> [u8; 512] {
    let mut p: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut x = (seed ^ salt).max(1);
    let mut next = || {
        // xorshift64
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        x
    };
    // Fisher–Yates
    for i in (1..256).rev() {
        let j = (next() % (i as u64 + 1)) as usize;
        p.swap(i, j);
    }
    std::array::from_fn(|i| p[i & 255])
}

// A seeded noise source plus the two sampling offsets drawn for a build.
//
// Every layer (the base land layer and each distortion octave) reads the
// same source at `(x * frequency + offset_w, y * frequency + offset_h)`
// and scales the unit-range sample by its wavelength.
pub struct NoiseField {
    source: Box<dyn NoiseGenerator>,
    offset_w: f64,
    offset_h: f64,
}

impl NoiseField {
    pub fn new(source: Box<dyn NoiseGenerator>, offset_w: f32, offset_h: f32) -> Self {
        Self {
            source,
            offset_w: offset_w as f64,
            offset_h: offset_h as f64,
        }
    }

    // Draws both offsets from the build stream, before anything else uses it.
    pub fn seeded<R: Rng>(basis: NoiseBasis, octaves: Octaves, seed: u64, rng: &mut R) -> Self {
        let offset_w = rng.gen_range(0.0..OFFSET_RANGE);
        let offset_h = rng.gen_range(0.0..OFFSET_RANGE);
        let source: Box<dyn NoiseGenerator> = match basis {
            NoiseBasis::Perlin => Box::new(Perlin2D::new(seed, 1.0, octaves)),
            NoiseBasis::Simplex => Box::new(Simplex2D::new(seed, 1.0, octaves)),
        };
        Self::new(source, offset_w, offset_h)
    }

    pub fn offsets(&self) -> (f32, f32) {
        (self.offset_w as f32, self.offset_h as f32)
    }

    // wavelength × noise01(x·frequency + offset_w, y·frequency + offset_h)
    pub fn sample(&self, x: usize, y: usize, wavelength: f32, frequency: f32) -> f32 {
        let nx = x as f64 * frequency as f64 + self.offset_w;
        let ny = y as f64 * frequency as f64 + self.offset_h;
        wavelength * self.source.get2_unit(nx, ny) as f32
    }
}
