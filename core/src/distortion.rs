use tracing::{debug, warn};

use crate::heightfield::HeightField;
use crate::noise::NoiseField;

// Extra noise octaves subtracted from every cell for grain. Subtracting
// keeps already-high ground from being pushed past the top of the range.
pub struct DistortionPass<'a> {
    pub noise: &'a NoiseField,
    pub wavelengths: &'a [f32],
    pub frequencies: &'a [f32],
}

impl DistortionPass<'_> {
    pub fn apply(&self, mut field: HeightField) -> HeightField {
        if self.wavelengths.is_empty() || self.frequencies.is_empty() {
            debug!("distortion skipped: no octaves configured");
            return field;
        }
        if self.wavelengths.len() != self.frequencies.len() {
            warn!(
                wavelengths = self.wavelengths.len(),
                frequencies = self.frequencies.len(),
                "distortion skipped: octave arrays differ in length"
            );
            return field;
        }

        let r = field.resolution();
        for (&wavelength, &frequency) in self.wavelengths.iter().zip(self.frequencies) {
            for y in 0..r {
                for x in 0..r {
                    field.add(x, y, -self.noise.sample(x, y, wavelength, frequency));
                }
            }
        }
        field
    }
}
