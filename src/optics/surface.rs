use std::fmt;

use crate::error::ConfigError;

use super::property::{PropertyKey, PropertyTable};

slotmap::new_key_type! {
    /// Unique identifier for an optical surface in the geometry store.
    pub struct SurfaceId;
}

/// Kind of interface an optical surface describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceType {
    DielectricDielectric,
    DielectricMetal,
    DielectricLut,
}

/// Model used to treat surface roughness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceModel {
    /// Roughness from the `polish` parameter.
    Glisur,
    /// Micro-facet model with Gaussian `sigma_alpha` and reflection-type
    /// probabilities.
    Unified,
    /// Measured angular look-up tables.
    Lut,
}

/// Measured surface treatments available in the LUT model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LutFinish {
    PolishedLumirrorAir,
    PolishedLumirrorGlue,
    PolishedAir,
    PolishedTeflonAir,
    PolishedTiOAir,
    PolishedTyvekAir,
    PolishedVm2000Air,
    PolishedVm2000Glue,
    EtchedLumirrorAir,
    EtchedLumirrorGlue,
    EtchedAir,
    EtchedTeflonAir,
    EtchedTiOAir,
    EtchedTyvekAir,
    EtchedVm2000Air,
    EtchedVm2000Glue,
    GroundLumirrorAir,
    GroundLumirrorGlue,
    GroundAir,
    GroundTeflonAir,
    GroundTiOAir,
    GroundTyvekAir,
    GroundVm2000Air,
    GroundVm2000Glue,
}

impl LutFinish {
    /// Name of the reflection status this finish produces.
    #[must_use]
    pub fn reflection_name(self) -> &'static str {
        match self {
            Self::PolishedLumirrorAir => "PolishedLumirrorAirReflection",
            Self::PolishedLumirrorGlue => "PolishedLumirrorGlueReflection",
            Self::PolishedAir => "PolishedAirReflection",
            Self::PolishedTeflonAir => "PolishedTeflonAirReflection",
            Self::PolishedTiOAir => "PolishedTiOAirReflection",
            Self::PolishedTyvekAir => "PolishedTyvekAirReflection",
            Self::PolishedVm2000Air => "PolishedVM2000AirReflection",
            Self::PolishedVm2000Glue => "PolishedVM2000GlueReflection",
            Self::EtchedLumirrorAir => "EtchedLumirrorAirReflection",
            Self::EtchedLumirrorGlue => "EtchedLumirrorGlueReflection",
            Self::EtchedAir => "EtchedAirReflection",
            Self::EtchedTeflonAir => "EtchedTeflonAirReflection",
            Self::EtchedTiOAir => "EtchedTiOAirReflection",
            Self::EtchedTyvekAir => "EtchedTyvekAirReflection",
            Self::EtchedVm2000Air => "EtchedVM2000AirReflection",
            Self::EtchedVm2000Glue => "EtchedVM2000GlueReflection",
            Self::GroundLumirrorAir => "GroundLumirrorAirReflection",
            Self::GroundLumirrorGlue => "GroundLumirrorGlueReflection",
            Self::GroundAir => "GroundAirReflection",
            Self::GroundTeflonAir => "GroundTeflonAirReflection",
            Self::GroundTiOAir => "GroundTiOAirReflection",
            Self::GroundTyvekAir => "GroundTyvekAirReflection",
            Self::GroundVm2000Air => "GroundVM2000AirReflection",
            Self::GroundVm2000Glue => "GroundVM2000GlueReflection",
        }
    }
}

impl fmt::Display for LutFinish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reflection_name())
    }
}

/// Surface finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFinish {
    Polished,
    PolishedFrontPainted,
    PolishedBackPainted,
    Ground,
    GroundFrontPainted,
    GroundBackPainted,
    /// A measured finish, only meaningful for [`SurfaceType::DielectricLut`].
    Lut(LutFinish),
}

impl SurfaceFinish {
    /// Returns `true` for the two back-painted finishes.
    #[must_use]
    pub fn is_back_painted(self) -> bool {
        matches!(self, Self::PolishedBackPainted | Self::GroundBackPainted)
    }

    /// Returns `true` for the two front-painted finishes.
    #[must_use]
    pub fn is_front_painted(self) -> bool {
        matches!(self, Self::PolishedFrontPainted | Self::GroundFrontPainted)
    }
}

/// Angular reflection distribution measured for a LUT surface.
///
/// Values are indexed by rounded incident angle in degrees (0..=90), a
/// polar bin (4 degree steps from -90) and an azimuthal bin (5 degree steps
/// from -90).
#[derive(Debug, Clone, PartialEq)]
pub struct AngularLut {
    theta_bins: usize,
    phi_bins: usize,
    values: Vec<f64>,
}

impl AngularLut {
    /// Number of incident-angle rows.
    pub const INCIDENT_BINS: usize = 91;

    /// Creates a table from a flat array laid out incident-fastest, then
    /// theta, then phi.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the array length does not
    /// match the dimensions.
    pub fn new(theta_bins: usize, phi_bins: usize, values: Vec<f64>) -> Result<Self, ConfigError> {
        if theta_bins == 0 || phi_bins == 0 {
            return Err(ConfigError::Invalid("angular LUT dimensions must be positive".into()));
        }
        let expected = Self::INCIDENT_BINS * theta_bins * phi_bins;
        if values.len() != expected {
            return Err(ConfigError::Invalid(format!(
                "angular LUT expects {expected} values, got {}",
                values.len()
            )));
        }
        Ok(Self {
            theta_bins,
            phi_bins,
            values,
        })
    }

    /// Number of polar bins.
    #[must_use]
    pub fn theta_bins(&self) -> usize {
        self.theta_bins
    }

    /// Number of azimuthal bins.
    #[must_use]
    pub fn phi_bins(&self) -> usize {
        self.phi_bins
    }

    /// Tabulated probability; 0 outside the table.
    #[must_use]
    pub fn value(&self, incident: usize, theta: usize, phi: usize) -> f64 {
        if incident >= Self::INCIDENT_BINS || theta >= self.theta_bins || phi >= self.phi_bins {
            return 0.0;
        }
        let idx = incident
            + theta * Self::INCIDENT_BINS
            + phi * self.theta_bins * Self::INCIDENT_BINS;
        self.values[idx]
    }
}

/// Optical description of an interface between two volumes.
#[derive(Debug, Clone)]
pub struct OpticalSurface {
    pub name: String,
    pub surface_type: SurfaceType,
    pub model: SurfaceModel,
    pub finish: SurfaceFinish,
    /// Standard deviation of the micro-facet tilt (radians), unified and
    /// LUT models.
    pub sigma_alpha: f64,
    /// Polish in `[0, 1]`, glisur model. 1 is perfectly smooth.
    pub polish: f64,
    pub properties: Option<PropertyTable>,
    pub angular_lut: Option<AngularLut>,
}

impl OpticalSurface {
    /// Creates a smooth surface with no property table.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        surface_type: SurfaceType,
        model: SurfaceModel,
        finish: SurfaceFinish,
    ) -> Self {
        Self {
            name: name.into(),
            surface_type,
            model,
            finish,
            sigma_alpha: 0.0,
            polish: 1.0,
            properties: None,
            angular_lut: None,
        }
    }

    /// Sets the micro-facet tilt width.
    #[must_use]
    pub fn with_sigma_alpha(mut self, sigma_alpha: f64) -> Self {
        self.sigma_alpha = sigma_alpha;
        self
    }

    /// Sets the polish, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_polish(mut self, polish: f64) -> Self {
        self.polish = polish.clamp(0.0, 1.0);
        self
    }

    /// Attaches a property table.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertyTable) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Attaches a measured angular distribution.
    #[must_use]
    pub fn with_angular_lut(mut self, lut: AngularLut) -> Self {
        self.angular_lut = Some(lut);
        self
    }

    /// Looks up a surface property at the given photon energy.
    #[must_use]
    pub fn property(&self, key: PropertyKey, energy: f64) -> Option<f64> {
        self.properties.as_ref()?.value(key, energy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lut_dimensions_checked() {
        assert!(AngularLut::new(2, 2, vec![0.0; 91 * 4]).is_ok());
        assert!(AngularLut::new(2, 2, vec![0.0; 10]).is_err());
        assert!(AngularLut::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn lut_indexing() {
        let mut values = vec![0.0; 91 * 3 * 2];
        values[5 + 2 * 91 + 3 * 91] = 0.7;
        let lut = AngularLut::new(3, 2, values).unwrap();
        assert_eq!(lut.value(5, 2, 1), 0.7);
        assert_eq!(lut.value(5, 2, 0), 0.0);
        assert_eq!(lut.value(91, 0, 0), 0.0);
    }

    #[test]
    fn finish_classes() {
        assert!(SurfaceFinish::GroundBackPainted.is_back_painted());
        assert!(!SurfaceFinish::Ground.is_back_painted());
        assert!(SurfaceFinish::PolishedFrontPainted.is_front_painted());
        assert!(!SurfaceFinish::Lut(LutFinish::GroundAir).is_front_painted());
    }

    #[test]
    fn polish_is_clamped() {
        let s = OpticalSurface::new(
            "s",
            SurfaceType::DielectricDielectric,
            SurfaceModel::Glisur,
            SurfaceFinish::Ground,
        )
        .with_polish(1.7);
        assert_eq!(s.polish, 1.0);
    }

    #[test]
    fn lut_reflection_names() {
        assert_eq!(LutFinish::EtchedVm2000Glue.to_string(), "EtchedVM2000GlueReflection");
    }
}
