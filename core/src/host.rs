// Interfaces to the world the pipeline runs inside, plus an in-memory
// implementation used by the CLI, benches and tests.

use glam::{Vec2, Vec3};

use crate::config::MaterialRef;
use crate::heightfield::{HeightField, HeightWindow};
use crate::ribbon::RibbonMesh;

// Ray march step as a fraction of the smaller cell edge
const MARCH_FRACTION: f32 = 0.25;
const BISECTION_STEPS: usize = 16;

// The terrain object that owns and renders the authoritative heightfield.
//
// Heights crossing this boundary are normalized samples, except
// `get_height` which answers in world units.
pub trait TerrainHost {
    fn resolution(&self) -> usize;

    // `(width, depth, length)` of the terrain in world units.
    fn size(&self) -> Vec3;

    // Replaces storage with `field`, adopting its resolution and extents.
    fn install(&mut self, field: HeightField);

    fn get_heights(&self, x: usize, y: usize, w: usize, h: usize) -> HeightWindow;

    fn set_heights(&mut self, x: usize, y: usize, heights: &HeightWindow);

    fn get_height(&self, x: usize, y: usize) -> f32;

    fn steepness_degrees(&self, nx: f32, ny: f32) -> f32;
}

// Ray intersection against the host world's surface.
pub trait RayCaster {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3>;
}

// Receives one renderable ribbon per traced river.
pub trait MeshSink {
    // Drops ribbons emitted by a previous build.
    fn clear_rivers(&mut self);

    fn add_ribbon(&mut self, mesh: RibbonMesh, material: &MaterialRef);
}

// Heightfield kept in memory. Raycasts hit the bilinear surface through
// the samples, with x spanning `width` and z spanning `length`.
#[derive(Debug, Clone)]
pub struct MemoryTerrain {
    field: HeightField,
}

impl MemoryTerrain {
    pub fn new(field: HeightField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    // World-unit surface height under `(x, z)`, `None` off the footprint.
    pub fn surface_at(&self, x: f32, z: f32) -> Option<f32> {
        let f = &self.field;
        let r = f.resolution();
        if r == 0 || !(0.0..=f.width()).contains(&x) || !(0.0..=f.length()).contains(&z) {
            return None;
        }
        if r == 1 {
            return Some(f.world_height(0, 0));
        }
        let (sx, sz) = f.cell_size();
        let g = Vec2::new(x / sx, z / sz);
        let last = r - 1;
        let x0 = (g.x.floor() as usize).min(last - 1);
        let y0 = (g.y.floor() as usize).min(last - 1);
        let (tx, ty) = (g.x - x0 as f32, g.y - y0 as f32);

        let a = f.world_height(x0, y0);
        let b = f.world_height(x0 + 1, y0);
        let c = f.world_height(x0, y0 + 1);
        let d = f.world_height(x0 + 1, y0 + 1);
        let ab = a + (b - a) * tx;
        let cd = c + (d - c) * tx;
        Some(ab + (cd - ab) * ty)
    }

    // Signed height of a point above the surface, `None` off the footprint
    fn clearance(&self, p: Vec3) -> Option<f32> {
        self.surface_at(p.x, p.z).map(|s| p.y - s)
    }
}

impl Default for MemoryTerrain {
    // single zero sample until a build installs a real field
    fn default() -> Self {
        Self::new(HeightField::flat(1, 1.0, 1.0, 1.0, 0.0))
    }
}

impl TerrainHost for MemoryTerrain {
    fn resolution(&self) -> usize {
        self.field.resolution()
    }

    fn size(&self) -> Vec3 {
        Vec3::new(self.field.width(), self.field.depth(), self.field.length())
    }

    fn install(&mut self, field: HeightField) {
        self.field = field;
    }

    fn get_heights(&self, x: usize, y: usize, w: usize, h: usize) -> HeightWindow {
        self.field.window(x, y, w, h)
    }

    fn set_heights(&mut self, x: usize, y: usize, heights: &HeightWindow) {
        self.field.write_window(x, y, heights);
    }

    fn get_height(&self, x: usize, y: usize) -> f32 {
        self.field.world_height(x, y)
    }

    fn steepness_degrees(&self, nx: f32, ny: f32) -> f32 {
        self.field.steepness_degrees(nx, ny)
    }
}

impl RayCaster for MemoryTerrain {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }
        // starting underground never reaches the surface from above
        let start = self.clearance(origin)?;
        if start < 0.0 {
            return None;
        }
        if start == 0.0 {
            return Some(origin);
        }

        let (sx, sz) = self.field.cell_size();
        let step = (sx.min(sz) * MARCH_FRACTION).max(1e-4);
        let mut prev = 0.0f32;
        loop {
            let t = (prev + step).min(max_distance);
            if self.clearance(origin + dir * t)? <= 0.0 {
                // crossing lies in (prev, t]
                let (mut lo, mut hi) = (prev, t);
                for _ in 0..BISECTION_STEPS {
                    let mid = 0.5 * (lo + hi);
                    match self.clearance(origin + dir * mid) {
                        Some(c) if c > 0.0 => lo = mid,
                        _ => hi = mid,
                    }
                }
                let hit = origin + dir * hi;
                let y = self.surface_at(hit.x, hit.z).unwrap_or(hit.y);
                return Some(Vec3::new(hit.x, y, hit.z));
            }
            if t >= max_distance {
                return None;
            }
            prev = t;
        }
    }
}

// `MeshSink` that keeps every ribbon it receives.
#[derive(Debug, Default, Clone)]
pub struct RibbonCollector {
    pub ribbons: Vec<(RibbonMesh, MaterialRef)>,
}

impl MeshSink for RibbonCollector {
    fn clear_rivers(&mut self) {
        self.ribbons.clear();
    }

    fn add_ribbon(&mut self, mesh: RibbonMesh, material: &MaterialRef) {
        self.ribbons.push((mesh, material.clone()));
    }
}
