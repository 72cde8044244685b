use crate::noise::{NoiseGenerator, Octaves, permutation};

// Salt mixed into the seed so Perlin and Simplex tables differ for one seed
const PERLIN_SALT: u64 = 0xDEAD_BEEF_CAFE_BABE;

// 2D Perlin gradient noise, optionally stacked into octaves
pub struct Perlin2D {
    frequency: f64, // scale applied to incoming coordinates
    octaves: Octaves,
    perm: [u8; 512],
}

impl Perlin2D {
    pub fn new(seed: u64, frequency: f64, octaves: Octaves) -> Self {
        Self {
            frequency,
            octaves,
            perm: permutation(seed, PERLIN_SALT),
        }
    }

    // 6t^5 − 15t^4 + 10t^3, zero first and second derivative at both ends
    #[inline]
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    // Picks one of the eight diagonal/axis gradients from the low hash bits
    // and returns its dot product with (x, y)
    #[inline]
    fn grad(hash: u8, x: f64, y: f64) -> f64 {
        let h = hash & 0xF;
        let (u, v) = if h < 8 { (x, y) } else { (y, x) };
        let u = if h & 1 == 0 { u } else { -u };
        let v = if h & 2 == 0 { v } else { -v };
        u + v
    }

    #[inline]
    fn hash(&self, xi: usize, yi: usize) -> u8 {
        self.perm[self.perm[xi] as usize + yi]
    }

    // Single octave at (x, y), roughly in [−1, 1]
    fn raw(&self, x: f64, y: f64) -> f64 {
        let (x0, y0) = (x.floor(), y.floor());
        let xi = (x0 as i64 & 255) as usize;
        let yi = (y0 as i64 & 255) as usize;
        let (xf, yf) = (x - x0, y - y0);
        let (u, v) = (Self::fade(xf), Self::fade(yf));

        let aa = self.hash(xi, yi);
        let ab = self.hash(xi, yi + 1);
        let ba = self.hash(xi + 1, yi);
        let bb = self.hash(xi + 1, yi + 1);

        let bottom = Self::lerp(Self::grad(aa, xf, yf), Self::grad(ba, xf - 1.0, yf), u);
        let top = Self::lerp(
            Self::grad(ab, xf, yf - 1.0),
            Self::grad(bb, xf - 1.0, yf - 1.0),
            u,
        );
        Self::lerp(bottom, top, v)
    }
}

impl NoiseGenerator for Perlin2D {
    fn get2(&self, x: f64, y: f64) -> f64 {
        let f = self.frequency;
        self.octaves
            .fbm(x * f, y * f, |sx, sy| self.raw(sx, sy))
            .clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Perlin2D;
    use crate::noise::{NoiseGenerator, Octaves};

    #[test]
    fn perlin2_determinism() {
        let octaves = Octaves {
            count: 4,
            persistence: 0.5,
        };
        let p1 = Perlin2D::new(1234, 0.01, octaves);
        let p2 = Perlin2D::new(1234, 0.01, octaves);
        assert_eq!(p1.get2(10.5, -3.7), p2.get2(10.5, -3.7));
    }

    #[test]
    fn perlin2_range() {
        let p = Perlin2D::new(
            0,
            0.1,
            Octaves {
                count: 6,
                persistence: 0.5,
            },
        );
        for &(x, y) in &[(0.0, 0.0), (5.3, -1.2), (100.1, 200.2), (9998.7, 4321.0)] {
            let v = p.get2(x, y);
            assert!((-1.0..=1.0).contains(&v));
            assert!((0.0..=1.0).contains(&p.get2_unit(x, y)));
        }
    }

    #[test]
    // Gradient noise vanishes on integer lattice points
    fn perlin2_zero_at_lattice() {
        let p = Perlin2D::new(3, 1.0, Octaves::default());
        assert_eq!(p.get2(4.0, 17.0), 0.0);
        assert_eq!(p.get2_unit(4.0, 17.0), 0.5);
    }

    #[test]
    fn perlin2_seed_changes_output() {
        let a = Perlin2D::new(1, 1.0, Octaves::default());
        let b = Perlin2D::new(2, 1.0, Octaves::default());
        let differs = (0..32).any(|i| {
            let x = i as f64 * 0.37 + 0.11;
            a.get2(x, x * 0.5) != b.get2(x, x * 0.5)
        });
        assert!(differs);
    }
}
