// Steepest-descent river tracing and channel carving.

use rand::Rng;

use crate::config::RiverParams;
use crate::heightfield::HeightField;
use crate::host::TerrainHost;

// One traced river: the cell it sprang from and every cell it then
// flowed into. Step `i` of `steps` carries path index `i + 1`; index 0
// marks unvisited ground and is never assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowPath {
    pub source: (usize, usize),
    pub steps: Vec<(usize, usize)>,
}

impl FlowPath {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    // Source followed by every step; what the ribbon is built along.
    pub fn points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        std::iter::once(self.source).chain(self.steps.iter().copied())
    }
}

pub struct RiverTracer<'a> {
    params: &'a RiverParams,
}

impl<'a> RiverTracer<'a> {
    pub fn new(params: &'a RiverParams) -> Self {
        Self { params }
    }

    // Traces `count` rivers from random starts. Heights come from `field`,
    // slopes from `host`, which must already hold the same surface.
    pub fn trace<R: Rng>(&self, field: &HeightField, host: &dyn TerrainHost, rng: &mut R) -> Vec<FlowPath> {
        let upper = field.resolution().saturating_sub(1).max(1);
        (0..self.params.count)
            .map(|_| {
                let start = (rng.gen_range(0..upper), rng.gen_range(0..upper));
                self.trace_from(field, host, start)
            })
            .collect()
    }

    pub fn trace_from(&self, field: &HeightField, host: &dyn TerrainHost, start: (usize, usize)) -> FlowPath {
        let r = field.resolution();
        let max_len = self.params.max_length.unwrap_or(r);
        let norm = r.saturating_sub(1).max(1) as f32;
        let mut path = FlowPath {
            source: start,
            steps: Vec::new(),
        };

        let (mut x, mut y) = start;
        while path.len() < max_len {
            let here = field.get(x, y);
            let mut steepest = 0.0f32;
            let mut next = None;
            for dx in -1i64..=1 {
                for dy in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if !field.contains(nx, ny) {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    let steep = host.steepness_degrees(nx as f32 / norm, ny as f32 / norm);
                    // only downhill; on equal slopes the later neighbour wins
                    if steep >= steepest && field.get(nx, ny) < here {
                        steepest = steep;
                        next = Some((nx, ny));
                    }
                }
            }

            let Some(cell) = next else { break };
            if steepest < self.params.flatness_threshold {
                break;
            }
            (x, y) = cell;
            path.steps.push(cell);
        }
        path
    }

    // Lowers every step cell of every path by the carve depth, once per
    // river, in path order.
    pub fn carve(&self, mut field: HeightField, paths: &[FlowPath]) -> HeightField {
        for path in paths {
            for &(x, y) in &path.steps {
                field.add(x, y, -self.params.carve_depth);
            }
        }
        field
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::host::MemoryTerrain;

    // 8 × 8 world units, 4 high: falls half a unit per unit towards x = 0
    fn ramp() -> HeightField {
        HeightField::from_fn(9, 8.0, 4.0, 8.0, |x, _| x as f32 / 8.0)
    }

    fn assert_well_formed(path: &FlowPath, field: &HeightField) {
        let mut prev = path.source;
        for &cell in &path.steps {
            let dx = prev.0.abs_diff(cell.0);
            let dy = prev.1.abs_diff(cell.1);
            assert!(dx <= 1 && dy <= 1 && (dx, dy) != (0, 0));
            assert!(field.get(cell.0, cell.1) < field.get(prev.0, prev.1));
            prev = cell;
        }
        assert!(path.len() <= field.resolution());
    }

    #[test]
    fn flat_ground_yields_empty_path() {
        let field = HeightField::flat(9, 8.0, 4.0, 8.0, 0.5);
        let host = MemoryTerrain::new(field.clone());
        let params = RiverParams::default();
        let path = RiverTracer::new(&params).trace_from(&field, &host, (4, 4));
        assert!(path.is_empty());
    }

    #[test]
    fn ramp_path_runs_downhill_to_the_edge() {
        let field = ramp();
        let host = MemoryTerrain::new(field.clone());
        let params = RiverParams::default();
        let path = RiverTracer::new(&params).trace_from(&field, &host, (8, 4));
        assert_well_formed(&path, &field);
        // ties go to the last neighbour scanned: (x - 1, y + 1) until the far edge
        assert_eq!(path.steps[0], (7, 5));
        assert_eq!(path.steps[3], (4, 8));
        assert_eq!(*path.steps.last().unwrap(), (0, 8));
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn max_length_caps_the_path_inclusively() {
        let field = ramp();
        let host = MemoryTerrain::new(field.clone());
        let params = RiverParams {
            max_length: Some(3),
            ..RiverParams::default()
        };
        let path = RiverTracer::new(&params).trace_from(&field, &host, (8, 4));
        assert_eq!(path.len(), 3);
    }

    // Even rows descend in a serpentine joined by one gap per odd row; every
    // other odd-row cell is a wall at full height, so the walk is forced
    // through all 49 open cells and ends at (8, 8).
    fn serpentine() -> HeightField {
        HeightField::from_fn(9, 8.0, 10.0, 8.0, |x, y| {
            let row = y / 2;
            let gap = if row % 2 == 0 { 8 } else { 0 };
            let order = if y % 2 == 0 {
                row * 10 + if row % 2 == 0 { x } else { 8 - x }
            } else if x == gap {
                row * 10 + 9
            } else {
                return 1.0;
            };
            0.9 - 0.015 * order as f32
        })
    }

    #[test]
    fn default_cap_lets_a_path_reach_the_resolution() {
        let field = serpentine();
        let host = MemoryTerrain::new(field.clone());
        let params = RiverParams::default();
        assert_eq!(params.max_length, None);
        let path = RiverTracer::new(&params).trace_from(&field, &host, (0, 0));
        assert_well_formed(&path, &field);
        assert_eq!(path.len(), field.resolution());

        let uncapped = RiverParams {
            max_length: Some(usize::MAX),
            ..RiverParams::default()
        };
        let path = RiverTracer::new(&uncapped).trace_from(&field, &host, (0, 0));
        assert!(path.len() > field.resolution());
        assert_eq!(path.steps.last(), Some(&(8, 8)));
    }

    #[test]
    fn gentle_slopes_stop_the_river() {
        // about 0.9 degrees: below the 2 degree threshold
        let field = HeightField::from_fn(9, 8.0, 0.125, 8.0, |x, _| x as f32 / 8.0);
        let host = MemoryTerrain::new(field.clone());
        let params = RiverParams::default();
        let path = RiverTracer::new(&params).trace_from(&field, &host, (8, 4));
        assert!(path.is_empty());
    }

    #[test]
    fn carving_dips_each_river_once() {
        let field = ramp();
        let params = RiverParams::default();
        let tracer = RiverTracer::new(&params);
        let a = FlowPath {
            source: (5, 5),
            steps: vec![(4, 5), (3, 5)],
        };
        let b = FlowPath {
            source: (5, 4),
            steps: vec![(4, 5)],
        };
        let carved = tracer.carve(field.clone(), &[a, b]);
        assert!((carved.get(4, 5) - (field.get(4, 5) - 0.1)).abs() < 1e-6);
        assert!((carved.get(3, 5) - (field.get(3, 5) - 0.05)).abs() < 1e-6);
        assert_eq!(carved.get(5, 5), field.get(5, 5));
    }

    #[test]
    fn random_rivers_are_well_formed_and_repeatable() {
        let field = HeightField::from_fn(17, 16.0, 6.0, 16.0, |x, y| {
            let (fx, fy) = (x as f32 - 8.0, y as f32 - 5.0);
            1.0 - (fx * fx + fy * fy).sqrt() / 16.0
        });
        let host = MemoryTerrain::new(field.clone());
        let params = RiverParams {
            count: 12,
            ..RiverParams::default()
        };
        let tracer = RiverTracer::new(&params);
        let run = |seed| tracer.trace(&field, &host, &mut ChaCha8Rng::seed_from_u64(seed));
        let paths = run(17);
        assert_eq!(paths.len(), 12);
        assert!(paths.iter().any(|p| !p.is_empty()));
        for p in &paths {
            assert_well_formed(p, &field);
        }
        assert_eq!(paths, run(17));
    }
}
