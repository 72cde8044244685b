// Triangle-strip ribbons following traced rivers.

use glam::Vec3;

use crate::config::RibbonParams;
use crate::host::{RayCaster, TerrainHost};
use crate::rivers::FlowPath;

// Vertex and index buffers for one river. Vertices come in
// `(left, right)` pairs, one pair per cross-section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RibbonMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<u32>,
}

impl RibbonMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

pub struct RibbonBuilder<'a> {
    params: &'a RibbonParams,
}

impl<'a> RibbonBuilder<'a> {
    pub fn new(params: &'a RibbonParams) -> Self {
        Self { params }
    }

    // Builds the ribbon for `path` against the host's current (carved)
    // surface. A path without steps has no direction to follow and
    // yields an empty mesh.
    pub fn build(&self, path: &FlowPath, host: &dyn TerrainHost, rays: &dyn RayCaster) -> RibbonMesh {
        if path.is_empty() {
            return RibbonMesh::default();
        }
        let centres: Vec<Vec3> = path.points().map(|cell| world_position(host, cell)).collect();
        // probes start above the highest sample so a steep bank is never
        // entered from below, and reach past the lowest one
        let (lowest, highest) = surface_span(host);
        let probe_y = highest + self.params.probe_height;
        let max_distance = highest - lowest + 2.0 * self.params.probe_height;

        let mut mesh = RibbonMesh {
            vertices: Vec::with_capacity(2 * centres.len()),
            triangles: Vec::with_capacity(6 * (centres.len() - 1)),
        };
        for (i, &origin) in centres.iter().enumerate() {
            // the last section has no successor, so it keeps the incoming direction
            let flow = match centres.get(i + 1) {
                Some(&next) => next - origin,
                None => origin - centres[i - 1],
            };
            let left = Vec3::new(flow.x, 0.0, flow.z)
                .normalize_or_zero()
                .cross(Vec3::Y)
                .normalize_or_zero();

            for side in [left, -left] {
                let bank = origin + side * self.params.half_width;
                let probe = Vec3::new(bank.x, probe_y, bank.z);
                let vertex = rays.raycast(probe, Vec3::NEG_Y, max_distance).unwrap_or(bank);
                mesh.vertices.push(vertex);
            }
        }

        for section in 0..centres.len() as u32 - 1 {
            let v = section * 2;
            // left_i, left_i+1, right_i+1 then left_i, right_i+1, right_i
            mesh.triangles.extend_from_slice(&[v, v + 2, v + 3, v, v + 3, v + 1]);
        }
        mesh
    }
}

// Lowest and highest world-unit heights the host currently holds
fn surface_span(host: &dyn TerrainHost) -> (f32, f32) {
    let r = host.resolution();
    let depth = host.size().y;
    host.get_heights(0, 0, r, r)
        .data
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h * depth), hi.max(h * depth)))
}

// Cell centre in world space: x across `width`, z across `length`, y the surface height
fn world_position(host: &dyn TerrainHost, (x, y): (usize, usize)) -> Vec3 {
    let size = host.size();
    let steps = host.resolution().saturating_sub(1).max(1) as f32;
    Vec3::new(
        size.x * x as f32 / steps,
        host.get_height(x, y),
        size.z * y as f32 / steps,
    )
}
