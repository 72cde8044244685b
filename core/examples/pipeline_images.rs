// Builds a 257×257 terrain and saves the results as images:
// grayscale heights and the splat-tinted colour map with rivers

use sculpt_core::preview::{height_image, splat_image};
use sculpt_core::{BuildConfig, MemoryTerrain, RibbonCollector, TerrainPipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BuildConfig {
        seed: 2025,
        peak_count: 3,
        land_frequency: 0.01,
        distortion_wavelengths: vec![0.15, 0.05],
        distortion_frequencies: vec![0.03, 0.12],
        smoothing_passes: 2,
        ..BuildConfig::default()
    };
    let mut host = MemoryTerrain::default();
    let mut ribbons = RibbonCollector::default();
    let report = TerrainPipeline::new(config)?.build(&mut host, &mut ribbons)?;

    height_image(&report.field).save("terrain_heights.png")?;
    splat_image(&report.field, &report.splat, &report.rivers).save("terrain_splat.png")?;
    println!(
        "Saved terrain_heights.png and terrain_splat.png ({} rivers)",
        ribbons.ribbons.len()
    );
    Ok(())
}
