use rand::Rng;

use crate::heightfield::HeightField;
use crate::noise::NoiseField;

// Base terrain: one noise layer minus a radial falloff from `peaks`
// random high points, so land rises towards whichever peak is nearest.
pub struct HeightFieldSynthesizer<'a> {
    pub noise: &'a NoiseField,
    pub wavelength: f32,
    pub frequency: f32,
    pub peaks: usize,
}

impl HeightFieldSynthesizer<'_> {
    // `template` supplies resolution and extents; its samples are ignored
    pub fn generate<R: Rng>(&self, template: &HeightField, rng: &mut R) -> HeightField {
        let r = template.resolution();
        let peaks = self.place_peaks(r, rng);
        let gradient = falloff(r, &peaks);

        let mut field = template.blank_like(0.0);
        for y in 0..r {
            for x in 0..r {
                let n = self.noise.sample(x, y, self.wavelength, self.frequency);
                field.set(x, y, n - gradient[y * r + x]);
            }
        }
        field
    }

    fn place_peaks<R: Rng>(&self, resolution: usize, rng: &mut R) -> Vec<(usize, usize)> {
        let upper = resolution.saturating_sub(1).max(1);
        (0..self.peaks)
            .map(|_| (rng.gen_range(0..upper), rng.gen_range(0..upper)))
            .collect()
    }
}

// Distance from each cell to its nearest peak, divided by the resolution.
// Without peaks every cell stays at 0.
fn falloff(resolution: usize, peaks: &[(usize, usize)]) -> Vec<f32> {
    let mut gradient = vec![0.0f32; resolution * resolution];
    let Some((&first, rest)) = peaks.split_first() else {
        return gradient;
    };
    let norm = resolution as f32;
    let dist = |(px, py): (usize, usize), x: usize, y: usize| {
        let dx = px as f32 - x as f32;
        let dy = py as f32 - y as f32;
        (dx * dx + dy * dy).sqrt() / norm
    };

    for y in 0..resolution {
        for x in 0..resolution {
            gradient[y * resolution + x] = rest
                .iter()
                .fold(dist(first, x, y), |best, &p| best.min(dist(p, x, y)));
        }
    }
    gradient
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::noise::{NoiseBasis, Octaves};

    fn noise(seed: u64, rng: &mut ChaCha8Rng) -> NoiseField {
        NoiseField::seeded(NoiseBasis::Perlin, Octaves::default(), seed, rng)
    }

    #[test]
    fn falloff_takes_nearest_peak() {
        let g = falloff(9, &[(0, 0), (8, 8)]);
        assert_eq!(g[0], 0.0);
        assert_eq!(g[80], 0.0);
        // (4, 0) is 4 from the first peak and ~8.9 from the second
        assert!((g[4] - 4.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn no_peaks_is_pure_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = noise(3, &mut rng);
        let template = HeightField::for_detail(3, 10.0, 2.0, 10.0).unwrap();
        let synth = HeightFieldSynthesizer {
            noise: &n,
            wavelength: 1.0,
            frequency: 0.3,
            peaks: 0,
        };
        let field = synth.generate(&template, &mut rng);
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(field.get(x, y), n.sample(x, y, 1.0, 0.3));
            }
        }
    }

    #[test]
    fn peak_cell_keeps_full_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let n = noise(21, &mut rng);
        let template = HeightField::for_detail(4, 10.0, 2.0, 10.0).unwrap();
        let synth = HeightFieldSynthesizer {
            noise: &n,
            wavelength: 1.0,
            frequency: 0.1,
            peaks: 1,
        };
        let mut probe = rng.clone();
        let (px, py) = (probe.gen_range(0..16), probe.gen_range(0..16));
        let field = synth.generate(&template, &mut rng);
        assert_eq!(field.get(px, py), n.sample(px, py, 1.0, 0.1));
        // the far corner loses at least a quarter of the distance budget
        let (fx, fy) = (if px < 8 { 16 } else { 0 }, if py < 8 { 16 } else { 0 });
        assert!(field.get(fx, fy) < n.sample(fx, fy, 1.0, 0.1) - 0.25);
    }
}
