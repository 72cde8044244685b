// Square grid of normalized elevation samples plus the physical extents
// needed to turn grid steps into world distances.

use crate::error::BuildError;

// Largest supported detail level; `2^12 + 1` samples per side.
pub const MAX_DETAIL: u32 = 12;

// Rectangular block of height samples, row-major (`data[y * width + x]`).
#[derive(Debug, Clone, PartialEq)]
pub struct HeightWindow {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl HeightWindow {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }
}

// An `R × R` heightfield with `R = 2^detail + 1`.
//
// Samples are nominally in `[0, 1]` but intermediate stages may push them
// outside that range; nothing here clamps. `depth` is the world height of a
// sample equal to 1, `width` and `length` span the grid along x and y.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    resolution: usize,
    width: f32,
    depth: f32,
    length: f32,
    data: Vec<f32>,
}

impl HeightField {
    pub fn for_detail(detail: u32, width: f32, depth: f32, length: f32) -> Result<Self, BuildError> {
        if detail > MAX_DETAIL {
            return Err(BuildError::invalid(
                "detail",
                format!("{detail} exceeds the maximum of {MAX_DETAIL}"),
            ));
        }
        Ok(Self::flat((1usize << detail) + 1, width, depth, length, 0.0))
    }

    pub fn flat(resolution: usize, width: f32, depth: f32, length: f32, value: f32) -> Self {
        Self {
            resolution,
            width,
            depth,
            length,
            data: vec![value; resolution * resolution],
        }
    }

    // Same extents as `self`, every sample set to `value`.
    pub fn blank_like(&self, value: f32) -> Self {
        Self::flat(self.resolution, self.width, self.depth, self.length, value)
    }

    pub fn from_fn(
        resolution: usize,
        width: f32,
        depth: f32,
        length: f32,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> Self {
        let mut data = Vec::with_capacity(resolution * resolution);
        for y in 0..resolution {
            for x in 0..resolution {
                data.push(f(x, y));
            }
        }
        Self {
            resolution,
            width,
            depth,
            length,
            data,
        }
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.resolution + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.resolution + x] = value;
    }

    #[inline]
    pub fn add(&mut self, x: usize, y: usize, delta: f32) {
        self.data[y * self.resolution + x] += delta;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        let r = self.resolution as i64;
        (0..r).contains(&x) && (0..r).contains(&y)
    }

    // Height of a sample in world units.
    #[inline]
    pub fn world_height(&self, x: usize, y: usize) -> f32 {
        self.get(x, y) * self.depth
    }

    // Highest world-unit height of the field, or 0 when no sample is positive.
    pub fn highest_point(&self) -> f32 {
        self.data
            .iter()
            .fold(0.0f32, |acc, &h| acc.max(h * self.depth))
    }

    // World distance between neighbouring samples along x and y.
    pub fn cell_size(&self) -> (f32, f32) {
        let steps = self.resolution.saturating_sub(1).max(1) as f32;
        (self.width / steps, self.length / steps)
    }

    // Grid coordinate nearest to a normalized `[0, 1]` coordinate.
    pub fn nearest_cell(&self, nx: f32, ny: f32) -> (usize, usize) {
        let last = self.resolution.saturating_sub(1);
        let to_cell = |n: f32| ((n * last as f32).round().max(0.0) as usize).min(last);
        (to_cell(nx), to_cell(ny))
    }

    // Slope angle in degrees at a normalized coordinate.
    //
    // Uses central differences of world-unit heights over world-unit
    // spacing, falling back to one-sided differences on the border.
    pub fn steepness_degrees(&self, nx: f32, ny: f32) -> f32 {
        if self.resolution < 2 {
            return 0.0;
        }
        let (x, y) = self.nearest_cell(nx, ny);
        let (sx, sy) = self.cell_size();
        let last = self.resolution - 1;

        let slope = |lo: f32, hi: f32, span: usize, spacing: f32| {
            (hi - lo) * self.depth / (span as f32 * spacing)
        };
        let (x0, x1) = (x.saturating_sub(1), (x + 1).min(last));
        let (y0, y1) = (y.saturating_sub(1), (y + 1).min(last));
        let dx = slope(self.get(x0, y), self.get(x1, y), x1 - x0, sx);
        let dy = slope(self.get(x, y0), self.get(x, y1), y1 - y0, sy);

        (dx * dx + dy * dy).sqrt().atan().to_degrees()
    }

    // Copies out a `w × h` block starting at `(x, y)`, clipped to the grid.
    pub fn window(&self, x: usize, y: usize, w: usize, h: usize) -> HeightWindow {
        let w = w.min(self.resolution.saturating_sub(x));
        let h = h.min(self.resolution.saturating_sub(y));
        let mut out = HeightWindow::new(w, h);
        for wy in 0..h {
            let start = (y + wy) * self.resolution + x;
            out.data[wy * w..(wy + 1) * w].copy_from_slice(&self.data[start..start + w]);
        }
        out
    }

    // Writes `window` with its origin at `(x, y)`; parts outside the grid are dropped.
    pub fn write_window(&mut self, x: usize, y: usize, window: &HeightWindow) {
        let w = window.width.min(self.resolution.saturating_sub(x));
        let h = window.height.min(self.resolution.saturating_sub(y));
        for wy in 0..h {
            let start = (y + wy) * self.resolution + x;
            let src = wy * window.width;
            self.data[start..start + w].copy_from_slice(&window.data[src..src + w]);
        }
    }

    // Copy rescaled so the lowest sample is 0 and the highest is 1.
    pub fn normalized_copy(&self) -> Self {
        let (min, max) = self
            .data
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = (max - min).max(0.001); // prevent zero-division
        let mut out = self.clone();
        for v in out.data.iter_mut() {
            *v = (*v - min) / range;
        }
        out
    }
}
