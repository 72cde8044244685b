// Quick-look images of a build: a grayscale heightmap and a lit,
// splat-tinted colour map with rivers drawn on top.

use image::{GrayImage, Luma, Rgb, RgbImage};
use palette::{Gradient, LinSrgb};

use crate::heightfield::HeightField;
use crate::rivers::FlowPath;
use crate::splat::{BLEND_LAYER, CLIFF_LAYER, SNOW_LAYER, SplatMap};

const SUN_AZIMUTH: f32 = std::f32::consts::FRAC_PI_4;
const SUN_ALTITUDE: f32 = std::f32::consts::FRAC_PI_4;
const RIVER_RGB: [u8; 3] = [40, 90, 200];

pub fn height_image(field: &HeightField) -> GrayImage {
    let r = field.resolution() as u32;
    let norm = field.normalized_copy();
    GrayImage::from_fn(r, r, |x, y| {
        Luma([(norm.get(x as usize, y as usize) * 255.0).round() as u8])
    })
}

// Lambertian shading from a sun at 45° azimuth and altitude, in [0, 1]
fn hillshade(field: &HeightField, x: usize, y: usize) -> f32 {
    let r = field.resolution();
    if x == 0 || y == 0 || x + 1 >= r || y + 1 >= r {
        return 1.0;
    }
    let (sx, sy) = field.cell_size();
    let dzdx = (field.world_height(x + 1, y) - field.world_height(x - 1, y)) / (2.0 * sx);
    let dzdy = (field.world_height(x, y + 1) - field.world_height(x, y - 1)) / (2.0 * sy);
    let len = (dzdx * dzdx + dzdy * dzdy + 1.0).sqrt();
    let (nx, ny, nz) = (-dzdx / len, -dzdy / len, 1.0 / len);

    let (sin_alt, cos_alt) = SUN_ALTITUDE.sin_cos();
    let lx = SUN_AZIMUTH.cos() * cos_alt;
    let ly = SUN_AZIMUTH.sin() * cos_alt;
    (nx * lx + ny * ly + nz * sin_alt).max(0.0)
}

pub fn splat_image(field: &HeightField, splat: &SplatMap, rivers: &[FlowPath]) -> RgbImage {
    let r = field.resolution();
    let norm = field.normalized_copy();
    // mid-blend layer shades from lowland green to bare rock with height
    let lowland = Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.8, 0.8, 0.5)),
        (0.30, LinSrgb::new(0.1, 0.6, 0.2)),
        (0.75, LinSrgb::new(0.5, 0.4, 0.3)),
        (1.00, LinSrgb::new(0.6, 0.6, 0.6)),
    ]);
    let snow = LinSrgb::new(1.0, 1.0, 1.0);
    let cliff = LinSrgb::new(0.35, 0.3, 0.28);

    let splat_last = splat.resolution().saturating_sub(1) as f32;
    let field_last = r.saturating_sub(1).max(1) as f32;

    let mut img = RgbImage::new(r as u32, r as u32);
    for y in 0..r {
        for x in 0..r {
            let sx = (x as f32 / field_last * splat_last).round() as usize;
            let sy = (y as f32 / field_last * splat_last).round() as usize;
            let w = splat.weights(sx, sy);
            let blend: LinSrgb = lowland.get(norm.get(x, y));

            let mix = |pick: fn(&LinSrgb) -> f32| {
                pick(&snow) * w[SNOW_LAYER] + pick(&cliff) * w[CLIFF_LAYER] + pick(&blend) * w[BLEND_LAYER]
            };
            let base = LinSrgb::new(mix(|c| c.red), mix(|c| c.green), mix(|c| c.blue));
            let rgb = base.into_format::<u8>();

            let light = (hillshade(field, x, y) * 0.5 + 0.5).clamp(0.0, 1.0);
            img.put_pixel(
                x as u32,
                y as u32,
                Rgb([
                    (rgb.red as f32 * light) as u8,
                    (rgb.green as f32 * light) as u8,
                    (rgb.blue as f32 * light) as u8,
                ]),
            );
        }
    }

    for river in rivers {
        for (x, y) in river.points().skip(1) {
            img.put_pixel(x as u32, y as u32, Rgb(RIVER_RGB));
        }
    }
    img
}
