// Droplet hydraulic erosion.
//
// Each droplet starts on a random interior cell and walks one cell per
// step in the direction its inertia-blended gradient points, picking up
// sediment on descents and dropping it when it slows or climbs.

use glam::Vec2;
use rand::Rng;

use crate::config::ErosionParams;
use crate::heightfield::HeightField;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErosionStats {
    pub droplets: usize,
    pub steps: usize,
    // world units moved out of / back into the grid
    pub eroded: f32,
    pub deposited: f32,
}

struct Droplet {
    x: usize,
    y: usize,
    dir: Vec2,
    speed: f32,
    water: f32,
    sediment: f32,
}

pub struct HydraulicErosion<'a> {
    params: &'a ErosionParams,
}

impl<'a> HydraulicErosion<'a> {
    pub fn new(params: &'a ErosionParams) -> Self {
        Self { params }
    }

    pub fn apply<R: Rng>(&self, mut field: HeightField, rng: &mut R) -> (HeightField, ErosionStats) {
        let mut stats = ErosionStats::default();
        let r = field.resolution();
        // gradient sampling needs a one-cell margin on every side
        if r < 3 {
            return (field, stats);
        }
        // height changes are measured against the stage input, in world units
        let snapshot = field.clone();

        for _ in 0..self.params.num_droplets {
            let mut drop = Droplet {
                x: rng.gen_range(1..=r - 2),
                y: rng.gen_range(1..=r - 2),
                dir: Vec2::ZERO,
                speed: self.params.starting_speed,
                water: self.params.starting_water,
                sediment: 0.0,
            };
            stats.droplets += 1;
            for _ in 0..self.params.max_path {
                if !self.step(&mut drop, &mut field, &snapshot, &mut stats) {
                    break;
                }
                stats.steps += 1;
            }
        }
        (field, stats)
    }

    // Advances one cell; false once the droplet stalls or leaves the interior
    fn step(
        &self,
        drop: &mut Droplet,
        field: &mut HeightField,
        snapshot: &HeightField,
        stats: &mut ErosionStats,
    ) -> bool {
        let p = self.params;
        let r = field.resolution();
        let depth = field.depth();
        let (old_x, old_y) = (drop.x, drop.y);

        let gradient = diagonal_gradient(field, old_x, old_y);
        let current = snapshot.world_height(old_x, old_y);
        drop.dir = drop.dir * p.inertia - gradient * (1.0 - p.inertia);

        let nx = old_x as i64 + unit_step(drop.dir.x);
        let ny = old_y as i64 + unit_step(drop.dir.y);
        let interior = 1..=(r as i64 - 2);
        if drop.dir == Vec2::ZERO || !interior.contains(&nx) || !interior.contains(&ny) {
            return false;
        }
        (drop.x, drop.y) = (nx as usize, ny as usize);

        // negative going downhill
        let height_change = snapshot.world_height(drop.x, drop.y) - current;
        let capacity = (-height_change * drop.speed * drop.water * p.sediment_capacity_factor)
            .max(p.min_sediment_capacity);

        if drop.sediment > capacity || height_change > 0.0 {
            // climbing fills the pit behind exactly; otherwise shed part of the excess
            let deposit = if height_change > 0.0 {
                height_change.min(drop.sediment)
            } else {
                (drop.sediment - capacity) * p.deposition_speed
            };
            drop.sediment -= deposit;
            field.add(old_x, old_y, deposit / depth);
            stats.deposited += deposit;
        } else {
            let erode = ((capacity - drop.sediment) * p.erosion_speed).min(-height_change);
            // never dig below zero
            let removed = (erode / depth).min(field.get(old_x, old_y)).max(0.0);
            field.add(old_x, old_y, -removed);
            drop.sediment += removed * depth;
            stats.eroded += removed * depth;
        }

        drop.speed = (drop.speed * drop.speed + height_change * p.gravity)
            .max(0.0)
            .sqrt();
        drop.water *= 1.0 - p.evaporation_speed;
        true
    }
}

// Gradient from the four diagonal neighbours of an interior cell
fn diagonal_gradient(field: &HeightField, x: usize, y: usize) -> Vec2 {
    let top_left = field.get(x - 1, y + 1);
    let top_right = field.get(x + 1, y + 1);
    let bottom_left = field.get(x - 1, y - 1);
    let bottom_right = field.get(x + 1, y - 1);
    Vec2::new(
        (top_right - top_left) + (bottom_right - bottom_left),
        (bottom_left - top_left) + (bottom_right - top_right),
    )
}

#[inline]
fn unit_step(v: f32) -> i64 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn params(num_droplets: usize) -> ErosionParams {
        ErosionParams {
            num_droplets,
            ..ErosionParams::default()
        }
    }

    fn bumpy(seed: u64) -> HeightField {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        HeightField::from_fn(33, 25.0, 2.0, 25.0, |_, _| rng.gen_range(0.0..1.0))
    }

    fn total(field: &HeightField) -> f32 {
        field.as_slice().iter().sum()
    }

    #[test]
    fn zero_droplets_is_identity() {
        let field = bumpy(1);
        let p = params(0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (out, stats) = HydraulicErosion::new(&p).apply(field.clone(), &mut rng);
        assert_eq!(out, field);
        assert_eq!(stats, ErosionStats::default());
    }

    #[test]
    fn flat_ground_stalls_every_droplet() {
        let field = HeightField::flat(17, 10.0, 2.0, 10.0, 0.5);
        let p = params(100);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let (out, stats) = HydraulicErosion::new(&p).apply(field.clone(), &mut rng);
        assert_eq!(out, field);
        assert_eq!(stats.droplets, 100);
        assert_eq!(stats.steps, 0);
    }

    #[test]
    fn tilted_plane_loses_material() {
        let field = HeightField::from_fn(17, 16.0, 4.0, 16.0, |x, _| x as f32 / 16.0);
        let p = params(50);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (out, stats) = HydraulicErosion::new(&p).apply(field.clone(), &mut rng);
        assert!(stats.steps > 0);
        assert!(stats.eroded > 0.0);
        assert!(total(&out) < total(&field));
    }

    #[test]
    fn never_erodes_below_zero() {
        let field = bumpy(4);
        let p = ErosionParams {
            num_droplets: 2000,
            erosion_speed: 1.0,
            sediment_capacity_factor: 50.0,
            ..ErosionParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let (out, _) = HydraulicErosion::new(&p).apply(field, &mut rng);
        assert!(out.as_slice().iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn border_cells_are_untouched() {
        let field = bumpy(5);
        let p = params(500);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let (out, _) = HydraulicErosion::new(&p).apply(field.clone(), &mut rng);
        let r = field.resolution();
        for i in 0..r {
            for (x, y) in [(i, 0), (i, r - 1), (0, i), (r - 1, i)] {
                assert_eq!(out.get(x, y), field.get(x, y));
            }
        }
    }

    #[test]
    fn same_seed_same_result() {
        let p = params(300);
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            HydraulicErosion::new(&p).apply(bumpy(6), &mut rng)
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn tiny_grids_are_skipped() {
        let field = HeightField::flat(2, 1.0, 1.0, 1.0, 0.3);
        let p = params(10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (out, stats) = HydraulicErosion::new(&p).apply(field.clone(), &mut rng);
        assert_eq!(out, field);
        assert_eq!(stats.droplets, 0);
    }
}
