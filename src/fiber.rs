//! Light capture by wavelength-shifting fiber shrouds.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::math::Point3;
use crate::random::RandomSource;

/// A cylindrical fiber shroud along the global z axis.
///
/// Trapped light travels to a readout at either end; the captured fraction
/// decays with the distance travelled as the sum of a long and a short
/// attenuation component.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ShroudParameters")]
pub struct FiberShroud {
    half_length: f64,
    translation: f64,
    att_long: f64,
    att_short: f64,
    trapping: [f64; 3],
}

#[derive(Deserialize)]
struct ShroudParameters {
    half_length: f64,
    translation: f64,
    att_long: f64,
    att_short: f64,
    trapping: [f64; 3],
}

impl TryFrom<ShroudParameters> for FiberShroud {
    type Error = ConfigError;

    fn try_from(p: ShroudParameters) -> Result<Self, Self::Error> {
        Self::new(p.half_length, p.translation, p.att_long, p.att_short, p.trapping)
    }
}

impl FiberShroud {
    /// Creates a shroud.
    ///
    /// `trapping` holds the cumulative trapping fractions of the core, core
    /// plus first cladding, and core plus both claddings.
    ///
    /// # Errors
    ///
    /// Returns an error if a length is not positive or the trapping
    /// fractions are not ordered within `[0, 1]`.
    pub fn new(
        half_length: f64,
        translation: f64,
        att_long: f64,
        att_short: f64,
        trapping: [f64; 3],
    ) -> Result<Self, ConfigError> {
        for (parameter, value) in [
            ("fiber.half_length", half_length),
            ("fiber.att_long", att_long),
            ("fiber.att_short", att_short),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    parameter,
                    value,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
        }
        let [core, clad1, clad2] = trapping;
        if !(0.0 <= core && core <= clad1 && clad1 <= clad2 && clad2 <= 1.0) {
            return Err(ConfigError::TrappingFractions(trapping));
        }
        Ok(Self {
            half_length,
            translation,
            att_long,
            att_short,
            trapping,
        })
    }

    #[must_use]
    pub fn half_length(&self) -> f64 {
        self.half_length
    }

    #[must_use]
    pub fn translation(&self) -> f64 {
        self.translation
    }

    #[must_use]
    pub fn trapping(&self) -> [f64; 3] {
        self.trapping
    }

    /// Captured fraction after travelling `x` mm along the fiber.
    #[must_use]
    pub fn intensity_at(&self, x: f64) -> f64 {
        let [_, i2, i3] = self.trapping;
        i2 * (-x / self.att_long).exp() + (i3 - i2) * (-x / self.att_short).exp()
    }

    /// Probability that a photon entering the shroud at `position` is
    /// trapped and read out.
    ///
    /// The readout end is picked at random, so the travelled distance is
    /// either the distance to the near end or its mirror.
    pub fn detection_probability<R: RandomSource + ?Sized>(
        &self,
        position: &Point3,
        rng: &mut R,
    ) -> f64 {
        let mut cur_z = position.z - (self.translation - self.half_length);
        if rng.uniform() < 0.5 {
            cur_z = 2.0 * self.half_length - cur_z;
        }
        self.intensity_at(cur_z)
    }

    /// [`Self::detection_probability`] clamped to `[0, 1]`, warning when
    /// the model overshoots.
    pub fn trapping_probability<R: RandomSource + ?Sized>(
        &self,
        position: &Point3,
        rng: &mut R,
    ) -> f64 {
        let p = self.detection_probability(position, rng);
        if p > 1.0 {
            warn!(probability = p, z = position.z, "fiber trapping probability above 1, clamped");
        }
        p.clamp(0.0, 1.0)
    }
}

/// Which volumes act as fiber shrouds and how well they capture light.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FiberConfig {
    /// Volume photons must come from for a same-material crossing to count.
    pub source_volume: String,
    /// Fraction of the shroud area covered by fibers.
    pub coverage: f64,
    /// Names of the shroud volumes.
    pub shrouds: Vec<String>,
    /// Optional attenuation model per shroud name.
    pub attenuation: HashMap<String, FiberShroud>,
}

impl Default for FiberConfig {
    fn default() -> Self {
        Self {
            source_volume: "larVolume".into(),
            coverage: 0.0,
            shrouds: vec!["innerShroud".into(), "outerShroud".into()],
            attenuation: HashMap::new(),
        }
    }
}

impl FiberConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the coverage is outside `[0, 1]` or an
    /// attenuation model names a volume that is not a shroud.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.coverage) {
            return Err(ConfigError::OutOfRange {
                parameter: "fibers.coverage",
                value: self.coverage,
                min: 0.0,
                max: 1.0,
            });
        }
        if let Some(name) = self.attenuation.keys().find(|name| !self.is_shroud(name)) {
            return Err(ConfigError::Invalid(format!(
                "attenuation model for {name}, which is not a fiber shroud"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_shroud(&self, volume: &str) -> bool {
        self.shrouds.iter().any(|s| s == volume)
    }

    /// Probability that a photon entering `volume` at `position` is
    /// captured, or `None` if the volume is not a shroud.
    ///
    /// Shrouds without an attenuation model capture with the bare
    /// coverage.
    pub fn capture_probability<R: RandomSource + ?Sized>(
        &self,
        volume: &str,
        position: &Point3,
        rng: &mut R,
    ) -> Option<f64> {
        if !self.is_shroud(volume) {
            return None;
        }
        let trapped = self
            .attenuation
            .get(volume)
            .map_or(1.0, |model| model.trapping_probability(position, rng));
        Some(self.coverage * trapped)
    }
}
