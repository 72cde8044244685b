// Height/slope texture weights.

use rayon::prelude::*;

use crate::config::SplatRules;
use crate::heightfield::HeightField;

pub const SNOW_LAYER: usize = 0;
pub const CLIFF_LAYER: usize = 1;
pub const BLEND_LAYER: usize = 2;

// Per-cell texture weights, `layers` entries per cell, each cell summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SplatMap {
    resolution: usize,
    layers: usize,
    weights: Vec<f32>,
}

impl SplatMap {
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn weights(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.resolution + x) * self.layers;
        &self.weights[start..start + self.layers]
    }

}

pub struct SurfaceClassifier<'a> {
    rules: &'a SplatRules,
}

impl<'a> SurfaceClassifier<'a> {
    pub fn new(rules: &'a SplatRules) -> Self {
        Self { rules }
    }

    // `max_height` is the highest world-unit point of `field`; heights are
    // expressed as a fraction of it and slopes as a fraction of 90°.
    pub fn classify(&self, field: &HeightField, max_height: f32) -> SplatMap {
        let res = self.rules.resolution.unwrap_or(field.resolution()).max(1);
        let layers = self.rules.layers.max(BLEND_LAYER + 1);
        let norm = res.saturating_sub(1).max(1) as f32;
        let mut weights = vec![0.0f32; res * res * layers];

        // no neighbour dependency, rows classify independently
        weights
            .par_chunks_mut(res * layers)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.chunks_mut(layers).enumerate() {
                    let (nx, ny) = (x as f32 / norm, y as f32 / norm);
                    let (hx, hy) = field.nearest_cell(nx, ny);
                    let height = if max_height > 0.0 {
                        field.world_height(hx, hy) / max_height
                    } else {
                        0.0
                    };
                    let slope = field.steepness_degrees(nx, ny) / 90.0;
                    self.weigh(height, slope, cell);
                }
            });

        SplatMap {
            resolution: res,
            layers,
            weights,
        }
    }

    // Snow takes priority on high ground, then gentle slopes blend, and
    // anything else is cliff, so every cell ends up with some texture
    fn weigh(&self, height: f32, slope: f32, cell: &mut [f32]) {
        let r = self.rules;
        if (r.min_altitude..=r.max_altitude).contains(&height) {
            cell[SNOW_LAYER] = 0.9;
            cell[CLIFF_LAYER] = 0.1;
        } else if (r.min_steepness..=r.max_steepness).contains(&slope) {
            cell[BLEND_LAYER] = 1.0;
        } else {
            cell[CLIFF_LAYER] = 1.0;
        }
        let total: f32 = cell.iter().sum();
        cell.iter_mut().for_each(|w| *w /= total);
    }
}
