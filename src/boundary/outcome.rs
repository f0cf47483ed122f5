use std::fmt;

use crate::math::Vector3;
use crate::optics::LutFinish;
use crate::track::Track;

/// New direction and polarization of a photon that keeps travelling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redirect {
    pub momentum: Vector3,
    pub polarization: Vector3,
}

impl Redirect {
    /// Builds a redirect from (possibly unnormalized) vectors.
    #[must_use]
    pub fn normalized(momentum: Vector3, polarization: Vector3) -> Self {
        Self {
            momentum: momentum.try_normalize(0.0).unwrap_or(momentum),
            polarization: polarization.try_normalize(0.0).unwrap_or(polarization),
        }
    }
}

/// Result of one boundary-process invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryOutcome {
    Undefined,
    /// Transmitted into the next medium. `group_velocity` is the new medium's
    /// `GROUPVEL` at the photon energy, when tabulated.
    FresnelRefraction {
        redirect: Redirect,
        group_velocity: Option<f64>,
    },
    FresnelReflection(Redirect),
    TotalInternalReflection(Redirect),
    LambertianReflection(Redirect),
    LobeReflection(Redirect),
    SpikeReflection(Redirect),
    BackScattering(Redirect),
    /// Reflection sampled from a measured angular distribution.
    LutReflection {
        finish: LutFinish,
        redirect: Redirect,
    },
    /// Absorbed at the surface; the track is killed.
    Absorption { deposit: f64 },
    /// Absorbed and detected; the track is killed.
    Detection { deposit: f64 },
    NotAtBoundary,
    SameMaterial,
    StepTooSmall,
    /// The material has no refractive index; the photon is absorbed.
    NoRindex { deposit: f64 },
    /// Absorbed by the wavelength shifter and re-emitted isotropically at
    /// a new energy.
    WavelengthShift { direction: Vector3, energy: f64 },
}

impl BoundaryOutcome {
    /// Diagnostic status of this outcome.
    #[must_use]
    pub fn status(&self) -> BoundaryStatus {
        match self {
            Self::Undefined => BoundaryStatus::Undefined,
            Self::FresnelRefraction { .. } => BoundaryStatus::FresnelRefraction,
            Self::FresnelReflection(_) => BoundaryStatus::FresnelReflection,
            Self::TotalInternalReflection(_) => BoundaryStatus::TotalInternalReflection,
            Self::LambertianReflection(_) => BoundaryStatus::LambertianReflection,
            Self::LobeReflection(_) => BoundaryStatus::LobeReflection,
            Self::SpikeReflection(_) => BoundaryStatus::SpikeReflection,
            Self::BackScattering(_) => BoundaryStatus::BackScattering,
            Self::LutReflection { finish, .. } => BoundaryStatus::LutReflection(*finish),
            Self::Absorption { .. } => BoundaryStatus::Absorption,
            Self::Detection { .. } => BoundaryStatus::Detection,
            Self::NotAtBoundary => BoundaryStatus::NotAtBoundary,
            Self::SameMaterial => BoundaryStatus::SameMaterial,
            Self::StepTooSmall => BoundaryStatus::StepTooSmall,
            Self::NoRindex { .. } => BoundaryStatus::NoRindex,
            Self::WavelengthShift { .. } => BoundaryStatus::WavelengthShift,
        }
    }

    /// New direction and polarization, for outcomes where the photon
    /// continues with a reflected or refracted state.
    #[must_use]
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::FresnelRefraction { redirect, .. } | Self::LutReflection { redirect, .. } => {
                Some(redirect)
            }
            Self::FresnelReflection(r)
            | Self::TotalInternalReflection(r)
            | Self::LambertianReflection(r)
            | Self::LobeReflection(r)
            | Self::SpikeReflection(r)
            | Self::BackScattering(r) => Some(r),
            _ => None,
        }
    }

    /// Returns `true` if the track must be stopped.
    #[must_use]
    pub fn kills_track(&self) -> bool {
        matches!(
            self,
            Self::Absorption { .. } | Self::Detection { .. } | Self::NoRindex { .. }
        )
    }

    /// Writes the outcome into the track.
    pub fn apply(&self, track: &mut Track) {
        match self {
            Self::FresnelRefraction {
                redirect,
                group_velocity,
            } => {
                track.momentum_direction = redirect.momentum;
                track.polarization = redirect.polarization;
                if let Some(v) = group_velocity {
                    track.velocity = *v;
                }
            }
            Self::Absorption { deposit }
            | Self::Detection { deposit }
            | Self::NoRindex { deposit } => track.kill(*deposit),
            Self::WavelengthShift { direction, energy } => {
                track.momentum_direction = *direction;
                track.kinetic_energy = *energy;
            }
            other => {
                if let Some(r) = other.redirect() {
                    track.momentum_direction = r.momentum;
                    track.polarization = r.polarization;
                }
            }
        }
    }
}

/// Field-less mirror of [`BoundaryOutcome`] used for diagnostics and
/// internal bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryStatus {
    Undefined,
    FresnelRefraction,
    FresnelReflection,
    TotalInternalReflection,
    LambertianReflection,
    LobeReflection,
    SpikeReflection,
    BackScattering,
    LutReflection(LutFinish),
    Absorption,
    Detection,
    NotAtBoundary,
    SameMaterial,
    StepTooSmall,
    NoRindex,
    WavelengthShift,
}

impl BoundaryStatus {
    /// Statuses that happen on nearly every step and are never logged
    /// above trace level.
    #[must_use]
    pub fn is_routine(self) -> bool {
        matches!(
            self,
            Self::NotAtBoundary | Self::StepTooSmall | Self::SameMaterial
        )
    }
}

impl fmt::Display for BoundaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "Undefined",
            Self::FresnelRefraction => "FresnelRefraction",
            Self::FresnelReflection => "FresnelReflection",
            Self::TotalInternalReflection => "TotalInternalReflection",
            Self::LambertianReflection => "LambertianReflection",
            Self::LobeReflection => "LobeReflection",
            Self::SpikeReflection => "SpikeReflection",
            Self::BackScattering => "BackScattering",
            Self::LutReflection(finish) => finish.reflection_name(),
            Self::Absorption => "Absorption",
            Self::Detection => "Detection",
            Self::NotAtBoundary => "NotAtBoundary",
            Self::SameMaterial => "SameMaterial",
            Self::StepTooSmall => "StepTooSmall",
            Self::NoRindex => "NoRINDEX",
            Self::WavelengthShift => "WavelengthShift",
        };
        f.write_str(name)
    }
}
