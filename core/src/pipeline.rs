// The build entry point: runs every stage in order over one owned
// heightfield and hands each stage's result to the host.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::distortion::DistortionPass;
use crate::erosion::{ErosionStats, HydraulicErosion};
use crate::error::BuildError;
use crate::heightfield::HeightField;
use crate::host::{MeshSink, RayCaster, TerrainHost};
use crate::noise::NoiseField;
use crate::ribbon::RibbonBuilder;
use crate::rivers::{FlowPath, RiverTracer};
use crate::smoothing::SmoothingFilter;
use crate::splat::{SplatMap, SurfaceClassifier};
use crate::synth::HeightFieldSynthesizer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    pub erosion: ErosionStats,
    pub ribbon_triangles: usize,
}

// Everything a build produced besides the ribbons sent to the mesh sink.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub field: HeightField,
    pub splat: SplatMap,
    pub rivers: Vec<FlowPath>,
    pub highest_point: f32,
    pub stats: BuildStats,
}

pub struct TerrainPipeline {
    config: BuildConfig,
}

impl TerrainPipeline {
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { config })
    }

    // Runs one full build. The host is reset to the configured resolution
    // and extents, then receives the heightfield after every stage; river
    // ribbons from any earlier build are cleared from `meshes` first.
    //
    // Given the same configuration the result is identical across runs:
    // all randomness comes from one stream seeded with `config.seed`.
    pub fn build<H>(&self, host: &mut H, meshes: &mut dyn MeshSink) -> Result<BuildReport, BuildError>
    where
        H: TerrainHost + RayCaster,
    {
        let c = &self.config;
        let started = Instant::now();
        let template = HeightField::for_detail(c.detail, c.width, c.max_height, c.length)?;
        info!(seed = c.seed, resolution = template.resolution(), "building terrain");

        meshes.clear_rivers();
        let mut rng = ChaCha8Rng::seed_from_u64(c.seed);
        let noise = NoiseField::seeded(c.noise, c.octaves, c.seed, &mut rng);
        let (offset_w, offset_h) = noise.offsets();
        debug!(offset_w, offset_h, "noise offsets drawn");

        let field = timed("synthesis", || {
            HeightFieldSynthesizer {
                noise: &noise,
                wavelength: c.land_wavelength,
                frequency: c.land_frequency,
                peaks: c.peak_count,
            }
            .generate(&template, &mut rng)
        });
        host.install(field.clone());

        let field = timed("distortion", || {
            DistortionPass {
                noise: &noise,
                wavelengths: &c.distortion_wavelengths,
                frequencies: &c.distortion_frequencies,
            }
            .apply(field)
        });
        publish(host, &field);

        let (field, erosion) = timed("erosion", || HydraulicErosion::new(&c.erosion).apply(field, &mut rng));
        debug!(
            droplets = erosion.droplets,
            steps = erosion.steps,
            eroded = erosion.eroded,
            deposited = erosion.deposited,
            "erosion finished"
        );
        publish(host, &field);

        let field = timed("smoothing", || SmoothingFilter::new(c.smoothing_passes).apply(field));
        publish(host, &field);

        let tracer = RiverTracer::new(&c.rivers);
        let rivers = timed("river tracing", || tracer.trace(&field, &*host, &mut rng));
        let field = tracer.carve(field, &rivers);
        publish(host, &field);

        let builder = RibbonBuilder::new(&c.rivers.ribbon);
        let mut ribbon_triangles = 0;
        for (i, river) in rivers.iter().enumerate() {
            let mesh = builder.build(river, &*host, &*host);
            debug!(river = i, length = river.len(), triangles = mesh.triangle_count(), "river traced");
            ribbon_triangles += mesh.triangle_count();
            meshes.add_ribbon(mesh, &c.rivers.material);
        }

        let highest_point = field.highest_point();
        let splat = timed("classification", || {
            SurfaceClassifier::new(&c.splat).classify(&field, highest_point)
        });

        info!(
            rivers = rivers.len(),
            highest_point,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "terrain built"
        );
        Ok(BuildReport {
            field,
            splat,
            rivers,
            highest_point,
            stats: BuildStats {
                erosion,
                ribbon_triangles,
            },
        })
    }
}

fn publish(host: &mut dyn TerrainHost, field: &HeightField) {
    let r = field.resolution();
    host.set_heights(0, 0, &field.window(0, 0, r, r));
}

fn timed<T>(stage: &str, run: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = run();
    debug!(stage, elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "stage done");
    out
}
