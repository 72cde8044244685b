use crate::heightfield::HeightField;

// Replaces every cell with the mean of its 3×3 neighbourhood, `passes` times.
// Each pass reads only the previous pass's grid; cells past the border are
// left out of both the sum and the count.
pub struct SmoothingFilter {
    passes: usize,
}

impl SmoothingFilter {
    pub fn new(passes: usize) -> Self {
        Self { passes }
    }

    pub fn apply(&self, field: HeightField) -> HeightField {
        let r = field.resolution();
        let mut current = field;
        let mut next = current.clone();

        for _ in 0..self.passes {
            for y in 0..r {
                let (y0, y1) = (y.saturating_sub(1), (y + 1).min(r - 1));
                for x in 0..r {
                    let (x0, x1) = (x.saturating_sub(1), (x + 1).min(r - 1));
                    let mut sum = 0.0;
                    for ny in y0..=y1 {
                        for nx in x0..=x1 {
                            sum += current.get(nx, ny);
                        }
                    }
                    let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f32;
                    next.set(x, y, sum / count);
                }
            }
            std::mem::swap(&mut current, &mut next);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::SmoothingFilter;
    use crate::heightfield::HeightField;

    fn spike() -> HeightField {
        let mut f = HeightField::flat(5, 1.0, 1.0, 1.0, 0.0);
        f.set(2, 2, 9.0);
        f
    }

    #[test]
    fn zero_passes_is_identity() {
        let f = spike();
        assert_eq!(SmoothingFilter::new(0).apply(f.clone()), f);
    }

    #[test]
    fn single_pass_spreads_evenly() {
        let out = SmoothingFilter::new(1).apply(spike());
        // every cell of the centre 3×3 block sees the spike once in 9 samples
        for y in 1..=3 {
            for x in 1..=3 {
                assert_eq!(out.get(x, y), 1.0);
            }
        }
        assert_eq!(out.get(0, 0), 0.0);
        assert_eq!(out.get(4, 2), 0.0);
    }

    #[test]
    fn corners_average_four_cells() {
        let mut f = HeightField::flat(3, 1.0, 1.0, 1.0, 0.0);
        f.set(0, 0, 4.0);
        let out = SmoothingFilter::new(1).apply(f);
        assert_eq!(out.get(0, 0), 1.0);
        // edge cell (1, 0) averages six
        assert!((out.get(1, 0) - 4.0 / 6.0).abs() < 1e-6);
        assert!((out.get(1, 1) - 4.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn passes_do_not_see_partial_updates() {
        // a pass that read its own writes would make this asymmetric
        let out = SmoothingFilter::new(2).apply(spike());
        for y in 0..5 {
            for x in 0..5 {
                assert!((out.get(x, y) - out.get(4 - x, 4 - y)).abs() < 1e-6);
                assert!((out.get(x, y) - out.get(y, x)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn flat_field_is_fixed_point() {
        let f = HeightField::flat(9, 1.0, 1.0, 1.0, 0.42);
        let out = SmoothingFilter::new(5).apply(f.clone());
        for (a, b) in out.as_slice().iter().zip(f.as_slice()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
