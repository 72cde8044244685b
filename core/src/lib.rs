// core holds the terrain build pipeline: noise synthesis, distortion,
// hydraulic erosion, smoothing, river carving and texture classification
pub mod config;
pub mod distortion;
pub mod erosion;
pub mod error;
pub mod heightfield;
pub mod host;
pub mod noise;
pub mod perlin2;
pub mod pipeline;
pub mod preview;
pub mod ribbon;
pub mod rivers;
pub mod simplex2;
pub mod smoothing;
pub mod splat;
pub mod synth;

pub use config::{BuildConfig, ErosionParams, MaterialRef, RibbonParams, RiverParams, SplatRules};
pub use distortion::DistortionPass;
pub use erosion::{ErosionStats, HydraulicErosion};
pub use error::BuildError;
pub use heightfield::{HeightField, HeightWindow};
pub use host::{MemoryTerrain, MeshSink, RayCaster, RibbonCollector, TerrainHost};
pub use noise::{NoiseBasis, NoiseField, NoiseGenerator, Octaves};
pub use perlin2::Perlin2D;
pub use pipeline::{BuildReport, BuildStats, TerrainPipeline};
pub use ribbon::{RibbonBuilder, RibbonMesh};
pub use rivers::{FlowPath, RiverTracer};
pub use simplex2::Simplex2D;
pub use smoothing::SmoothingFilter;
pub use splat::{SplatMap, SurfaceClassifier};
pub use synth::HeightFieldSynthesizer;
