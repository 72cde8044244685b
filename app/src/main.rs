use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use sculpt_core::preview::{height_image, splat_image};
use sculpt_core::{BuildConfig, MemoryTerrain, RibbonCollector, TerrainPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Builds one terrain against an in-memory host and writes preview images.
#[derive(Parser, Debug)]
#[command(name = "sculpt", version)]
struct Cli {
    /// TOML build configuration; every key is optional
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the configured detail (resolution = 2^detail + 1)
    #[arg(long)]
    detail: Option<u32>,

    /// Directory the preview images are written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

impl Cli {
    fn build_config(&self) -> anyhow::Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::load(path)?,
            None => BuildConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(detail) = self.detail {
            config.detail = detail;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.build_config()?;
    let seed = config.seed;

    let start = Instant::now();
    let mut host = MemoryTerrain::default();
    let mut ribbons = RibbonCollector::default();
    let report = TerrainPipeline::new(config)?.build(&mut host, &mut ribbons)?;
    let elapsed = start.elapsed().as_secs_f32() * 1000.0;

    let traced = report.rivers.iter().filter(|r| !r.is_empty()).count();
    info!(
        seed,
        resolution = report.field.resolution(),
        highest_point = report.highest_point,
        rivers = report.rivers.len(),
        traced,
        ribbon_triangles = report.stats.ribbon_triangles,
        "generated in {elapsed:.2} ms"
    );

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating {}", cli.out.display()))?;
    let heights = cli.out.join(format!("heightmap_{seed}.png"));
    let splat = cli.out.join(format!("splat_{seed}.png"));
    height_image(&report.field)
        .save(&heights)
        .with_context(|| format!("saving {}", heights.display()))?;
    splat_image(&report.field, &report.splat, &report.rivers)
        .save(&splat)
        .with_context(|| format!("saving {}", splat.display()))?;
    info!("saved {} and {}", heights.display(), splat.display());
    Ok(())
}
