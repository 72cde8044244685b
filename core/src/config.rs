// Build configuration: every knob of a single terrain build, loadable
// from TOML with any key left out falling back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::heightfield::MAX_DETAIL;
use crate::noise::{NoiseBasis, Octaves};

// Reference to the material a host renders river ribbons with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialRef(pub String);

impl Default for MaterialRef {
    fn default() -> Self {
        Self("water".to_string())
    }
}

// Droplet model for hydraulic erosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    pub num_droplets: usize,
    // 0 = direction follows the gradient every step, 1 = never turns
    pub inertia: f32,
    // keeps capacity above zero on flat ground
    pub min_sediment_capacity: f32,
    pub sediment_capacity_factor: f32,
    pub deposition_speed: f32,
    pub erosion_speed: f32,
    pub evaporation_speed: f32,
    pub gravity: f32,
    pub max_path: usize,
    pub starting_speed: f32,
    pub starting_water: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            num_droplets: 2,
            inertia: 0.1,
            min_sediment_capacity: 0.01,
            sediment_capacity_factor: 4.0,
            deposition_speed: 0.2,
            erosion_speed: 0.2,
            evaporation_speed: 0.01,
            gravity: 4.0,
            max_path: 30,
            starting_speed: 1.0,
            starting_water: 1.0,
        }
    }
}

// Lateral bank probing for river ribbons, in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonParams {
    pub half_width: f32,
    pub probe_height: f32,
}

impl Default for RibbonParams {
    fn default() -> Self {
        Self {
            half_width: 0.5,
            probe_height: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    pub count: usize,
    pub material: MaterialRef,
    // slope in degrees below which a river stops
    pub flatness_threshold: f32,
    // normalized height removed from each path cell, once per river
    pub carve_depth: f32,
    // `None` caps a path at the grid resolution
    pub max_length: Option<usize>,
    pub ribbon: RibbonParams,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self {
            count: 2,
            material: MaterialRef::default(),
            flatness_threshold: 2.0,
            carve_depth: 0.05,
            max_length: None,
            ribbon: RibbonParams::default(),
        }
    }
}

// Height/slope bands for the texture-weight classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplatRules {
    pub min_altitude: f32,
    pub max_altitude: f32,
    pub min_steepness: f32,
    pub max_steepness: f32,
    pub layers: usize,
    // `None` classifies one splat cell per height sample
    pub resolution: Option<usize>,
}

impl Default for SplatRules {
    fn default() -> Self {
        Self {
            min_altitude: 0.8,
            max_altitude: 1.0,
            min_steepness: 0.0,
            max_steepness: 0.65,
            layers: 3,
            resolution: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub seed: u64,
    pub width: f32,
    pub length: f32,
    // resolution = 2^detail + 1
    pub detail: u32,
    pub max_height: f32,
    pub peak_count: usize,
    pub noise: NoiseBasis,
    pub octaves: Octaves,
    pub land_wavelength: f32,
    pub land_frequency: f32,
    pub distortion_wavelengths: Vec<f32>,
    pub distortion_frequencies: Vec<f32>,
    pub erosion: ErosionParams,
    pub smoothing_passes: usize,
    pub rivers: RiverParams,
    pub splat: SplatRules,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 25.0,
            length: 25.0,
            detail: 8,
            max_height: 2.0,
            peak_count: 1,
            noise: NoiseBasis::default(),
            octaves: Octaves::default(),
            land_wavelength: 1.0,
            land_frequency: 1.0,
            distortion_wavelengths: vec![5.0],
            distortion_frequencies: vec![0.0],
            erosion: ErosionParams::default(),
            smoothing_passes: 0,
            rivers: RiverParams::default(),
            splat: SplatRules::default(),
        }
    }
}

impl BuildConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, BuildError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    // Rejects values no stage can work with. Mismatched distortion arrays
    // are not an error; that pass simply skips itself.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.detail > MAX_DETAIL {
            return Err(BuildError::invalid(
                "detail",
                format!("{} exceeds the maximum of {MAX_DETAIL}", self.detail),
            ));
        }
        for (field, value) in [
            ("width", self.width),
            ("length", self.length),
            ("max_height", self.max_height),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(BuildError::invalid(field, format!("must be positive, got {value}")));
            }
        }
        for (field, value) in [
            ("erosion.inertia", self.erosion.inertia),
            ("erosion.evaporation_speed", self.erosion.evaporation_speed),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BuildError::invalid(field, format!("must lie in [0, 1], got {value}")));
            }
        }
        if self.splat.layers < 3 {
            return Err(BuildError::invalid(
                "splat.layers",
                format!("needs at least 3 layers, got {}", self.splat.layers),
            ));
        }
        if self.splat.resolution == Some(0) {
            return Err(BuildError::invalid("splat.resolution", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let c = BuildConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.detail, 8);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = BuildConfig::from_toml_str(
            r#"
            seed = 7
            detail = 5
            noise = "simplex"
            distortion_wavelengths = [1.0, 0.5]
            distortion_frequencies = [0.05, 0.2]

            [erosion]
            num_droplets = 5000

            [rivers]
            count = 4
            material = "lava"
            "#,
        )
        .unwrap();
        assert_eq!(c.seed, 7);
        assert_eq!(c.detail, 5);
        assert_eq!(c.noise, NoiseBasis::Simplex);
        assert_eq!(c.erosion.num_droplets, 5000);
        assert_eq!(c.erosion.max_path, 30);
        assert_eq!(c.rivers.material, MaterialRef("lava".into()));
        assert_eq!(c.rivers.carve_depth, 0.05);
        assert_eq!(c.splat.max_steepness, 0.65);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            BuildConfig::from_toml_str("detail = 13"),
            Err(BuildError::InvalidConfig { field: "detail", .. })
        ));
        assert!(matches!(
            BuildConfig::from_toml_str("width = 0.0"),
            Err(BuildError::InvalidConfig { field: "width", .. })
        ));
        assert!(matches!(
            BuildConfig::from_toml_str("[splat]\nlayers = 2"),
            Err(BuildError::InvalidConfig { field: "splat.layers", .. })
        ));
        assert!(matches!(
            BuildConfig::from_toml_str("seed = \"x\""),
            Err(BuildError::Parse(_))
        ));
    }

    #[test]
    fn mismatched_distortion_is_accepted() {
        let mut c = BuildConfig::default();
        c.distortion_wavelengths = vec![1.0, 2.0];
        c.distortion_frequencies = vec![0.1];
        assert!(c.validate().is_ok());
    }
}
