use crate::noise::{NoiseGenerator, Octaves, permutation};

const SIMPLEX_SALT: u64 = 0x1234_5678_9ABC_DEF0;

// Skew/unskew factors between the square grid and the triangle lattice
const SQRT_3: f64 = 1.732_050_807_568_877_2;
const F2: f64 = 0.5 * (SQRT_3 - 1.0);
const G2: f64 = (3.0 - SQRT_3) / 6.0;

// Gradient directions picked by hash % 12
const GRAD3: [(f64, f64); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (1.0, 2.0),
    (-1.0, 2.0),
    (1.0, -2.0),
    (-1.0, -2.0),
];

// 2D simplex noise: triangles instead of squares, fewer directional artifacts
pub struct Simplex2D {
    frequency: f64,
    octaves: Octaves,
    perm: [u8; 512],
}

impl Simplex2D {
    pub fn new(seed: u64, frequency: f64, octaves: Octaves) -> Self {
        Self {
            frequency,
            octaves,
            perm: permutation(seed, SIMPLEX_SALT),
        }
    }

    // Radial falloff contribution of a single corner
    #[inline]
    fn corner(&self, gi: usize, x: f64, y: f64) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t <= 0.0 {
            return 0.0;
        }
        let (gx, gy) = GRAD3[gi];
        let t2 = t * t;
        t2 * t2 * (gx * x + gy * y)
    }

    fn raw(&self, xin: f64, yin: f64) -> f64 {
        let s = (xin + yin) * F2;
        let i = (xin + s).floor() as i64;
        let j = (yin + s).floor() as i64;

        let t = (i + j) as f64 * G2;
        let x0 = xin - (i as f64 - t);
        let y0 = yin - (j as f64 - t);

        // lower or upper triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let gi0 = self.perm[ii + self.perm[jj] as usize] as usize % 12;
        let gi1 = self.perm[ii + i1 + self.perm[jj + j1] as usize] as usize % 12;
        let gi2 = self.perm[ii + 1 + self.perm[jj + 1] as usize] as usize % 12;

        70.0 * (self.corner(gi0, x0, y0) + self.corner(gi1, x1, y1) + self.corner(gi2, x2, y2))
    }
}

impl NoiseGenerator for Simplex2D {
    fn get2(&self, x: f64, y: f64) -> f64 {
        let f = self.frequency;
        self.octaves
            .fbm(x * f, y * f, |sx, sy| self.raw(sx, sy))
            .clamp(-1.0, 1.0)
    }
}
