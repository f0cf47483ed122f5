use serde::Deserialize;

use crate::error::ConfigError;
use crate::math::units::NM;
use crate::math::{energy_to_wavelength, wavelength_to_energy};

/// Wavelength-shifter re-emission shortcut.
///
/// A photon at the excitation wavelength that enters the shifter material
/// is, with probability `probability`, replaced in place by an isotropic
/// photon at `reemission_nm`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WavelengthShiftConfig {
    /// Name of the shifter material.
    pub material: String,
    pub excitation_nm: f64,
    pub band_half_width_nm: f64,
    pub probability: f64,
    pub reemission_nm: f64,
}

impl Default for WavelengthShiftConfig {
    fn default() -> Self {
        Self {
            material: "LiquidArgonFiber".into(),
            excitation_nm: 128.0,
            band_half_width_nm: 1.0,
            probability: 0.0,
            reemission_nm: 450.0,
        }
    }
}

impl WavelengthShiftConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the probability is outside `[0, 1]`, a
    /// wavelength is not positive, or the band width is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigError::OutOfRange {
                parameter: "wavelength_shift.probability",
                value: self.probability,
                min: 0.0,
                max: 1.0,
            });
        }
        for (parameter, value) in [
            ("wavelength_shift.excitation_nm", self.excitation_nm),
            ("wavelength_shift.reemission_nm", self.reemission_nm),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    parameter,
                    value,
                    min: 0.0,
                    max: f64::INFINITY,
                });
            }
        }
        if self.band_half_width_nm < 0.0 {
            return Err(ConfigError::OutOfRange {
                parameter: "wavelength_shift.band_half_width_nm",
                value: self.band_half_width_nm,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        Ok(())
    }

    /// Returns `true` if a photon of `energy` crossing from material `from`
    /// into material `to` is shifted, given the uniform `draw`.
    #[must_use]
    pub fn triggers(&self, from: &str, to: &str, energy: f64, draw: f64) -> bool {
        if to != self.material || from == self.material || energy <= 0.0 {
            return false;
        }
        let wavelength = energy_to_wavelength(energy);
        let low = (self.excitation_nm - self.band_half_width_nm) * NM;
        let high = (self.excitation_nm + self.band_half_width_nm) * NM;
        (low..=high).contains(&wavelength) && draw < self.probability
    }

    /// Energy of the re-emitted photon.
    #[must_use]
    pub fn reemission_energy(&self) -> f64 {
        wavelength_to_energy(self.reemission_nm * NM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn enabled() -> WavelengthShiftConfig {
        WavelengthShiftConfig {
            probability: 0.5,
            ..WavelengthShiftConfig::default()
        }
    }

    #[test]
    fn triggers_only_inside_band() {
        let c = enabled();
        let at = |nm: f64| wavelength_to_energy(nm * NM);
        assert!(c.triggers("LAr", "LiquidArgonFiber", at(128.0), 0.1));
        assert!(c.triggers("LAr", "LiquidArgonFiber", at(128.9), 0.1));
        assert!(!c.triggers("LAr", "LiquidArgonFiber", at(129.5), 0.1));
        assert!(!c.triggers("LAr", "LiquidArgonFiber", at(400.0), 0.1));
    }

    #[test]
    fn requires_entering_the_shifter() {
        let c = enabled();
        let e = wavelength_to_energy(128.0 * NM);
        assert!(!c.triggers("LAr", "Copper", e, 0.0));
        assert!(!c.triggers("LiquidArgonFiber", "LiquidArgonFiber", e, 0.0));
    }

    #[test]
    fn draw_against_probability() {
        let c = enabled();
        let e = wavelength_to_energy(128.0 * NM);
        assert!(!c.triggers("LAr", "LiquidArgonFiber", e, 0.7));
        let off = WavelengthShiftConfig::default();
        assert!(!off.triggers("LAr", "LiquidArgonFiber", e, 0.0));
    }

    #[test]
    fn reemission_at_450_nm() {
        let c = WavelengthShiftConfig::default();
        assert_relative_eq!(
            energy_to_wavelength(c.reemission_energy()),
            450.0 * NM,
            max_relative = 1e-12
        );
    }

    #[test]
    fn validation() {
        assert!(WavelengthShiftConfig::default().validate().is_ok());
        let bad = WavelengthShiftConfig {
            probability: 1.5,
            ..WavelengthShiftConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
    }
}
