//! Optical boundary process.
//!
//! [`BoundaryProcess::post_step`] turns one transport step that ends on a
//! geometric boundary into a single [`BoundaryOutcome`]: Fresnel
//! reflection or refraction, one of the rough-surface reflection types,
//! absorption, detection, or wavelength-shift re-emission.

mod dielectric;
mod interaction;
mod lut;
mod metal;
mod outcome;
mod sampling;
mod wls;

pub use outcome::{BoundaryOutcome, BoundaryStatus, Redirect};
pub use sampling::{
    cube_rejection_direction, facet_normal, isotropic_direction, lambertian_direction,
    point_in_unit_ball, Roughness,
};
pub use wls::WavelengthShiftConfig;

use serde::Deserialize;
use tracing::{trace, warn};

use crate::error::{ConfigError, GeometryError, Result};
use crate::geometry::{GeometryQuery, VolumeId};
use crate::math::{Vector3, TOLERANCE};
use crate::optics::{Material, MaterialId, SurfaceType};
use crate::random::RandomSource;
use crate::track::Step;

use interaction::{Incident, Interaction};

/// Tunables of the boundary process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub wavelength_shift: WavelengthShiftConfig,
    /// Geometric tolerance in mm; steps shorter than half of it are ignored.
    pub surface_tolerance: f64,
    /// Reflections off a back paint before the photon is given up.
    pub max_paint_bounces: u32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            wavelength_shift: WavelengthShiftConfig::default(),
            surface_tolerance: TOLERANCE,
            max_paint_bounces: 1000,
        }
    }
}

impl BoundaryConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is negative or the shifter
    /// settings are invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.surface_tolerance < 0.0 {
            return Err(ConfigError::OutOfRange {
                parameter: "boundary.surface_tolerance",
                value: self.surface_tolerance,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        self.wavelength_shift.validate()
    }
}

/// Decides what happens to an optical photon at a boundary.
#[derive(Debug, Clone, Default)]
pub struct BoundaryProcess {
    config: BoundaryConfig,
}

impl BoundaryProcess {
    /// Creates a process with the given settings.
    #[must_use]
    pub fn new(config: BoundaryConfig) -> Self {
        Self { config }
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    /// Computes the outcome of `step` for the photon described by its
    /// post-step point.
    ///
    /// The re-emission draw is taken first on every call, whatever the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidNormal`] if the geometry has no
    /// normal at the crossing point, and a lookup error if a volume has no
    /// material.
    pub fn post_step<G, R>(
        &self,
        step: &Step,
        geometry: &G,
        rng: &mut R,
    ) -> Result<BoundaryOutcome>
    where
        G: GeometryQuery + ?Sized,
        R: RandomSource + ?Sized,
    {
        let draw = rng.uniform();

        if !step.at_boundary() {
            return Ok(Self::quiet(BoundaryOutcome::NotAtBoundary));
        }
        let (Some(pre), Some(post)) = (step.pre.volume, step.post.volume) else {
            return Ok(Self::quiet(BoundaryOutcome::NotAtBoundary));
        };
        if step.length <= self.config.surface_tolerance / 2.0 {
            return Ok(Self::quiet(BoundaryOutcome::StepTooSmall));
        }

        let point = &step.post.position;
        let invalid = || GeometryError::InvalidNormal {
            x: point.x,
            y: point.y,
            z: point.z,
        };
        let exit = geometry
            .exit_normal(pre, Some(post), point)
            .ok_or_else(invalid)?;
        let exit = exit
            .try_normalize(0.0)
            .filter(|n| n.iter().all(|c| c.is_finite()))
            .ok_or_else(invalid)?;

        let momentum = step.post.momentum_direction;
        let normal = oriented_normal(&exit, &momentum);

        let (pre_material_id, pre_material) = Self::material_of(geometry, pre)?;
        let (post_material_id, post_material) = Self::material_of(geometry, post)?;
        let energy = step.post.kinetic_energy;

        let shift = &self.config.wavelength_shift;
        if shift.triggers(&pre_material.name, &post_material.name, energy, draw) {
            let outcome = BoundaryOutcome::WavelengthShift {
                direction: cube_rejection_direction(rng),
                energy: shift.reemission_energy(),
            };
            trace!(status = %outcome.status(), "boundary");
            return Ok(outcome);
        }

        let Some(rindex1) = pre_material.rindex(energy) else {
            return Ok(Self::no_rindex(&pre_material.name, energy));
        };

        let incident = Incident {
            energy,
            momentum,
            polarization: step.post.polarization,
            normal,
        };
        let mut interaction = Interaction::new(
            incident,
            pre_material,
            post_material,
            rindex1,
            self.config.max_paint_bounces,
        );

        if let Some(surface) = geometry.optical_surface(pre, post) {
            if let Some(outcome) = interaction.with_surface(surface, rng) {
                if let BoundaryOutcome::NoRindex { deposit } = outcome {
                    return Ok(Self::no_rindex(&surface.name, deposit));
                }
                trace!(status = %outcome.status(), surface = %surface.name, "boundary");
                return Ok(outcome);
            }
        }

        let finish = interaction.finish;
        if interaction.surface_type == SurfaceType::DielectricDielectric
            && !finish.is_back_painted()
            && !finish.is_front_painted()
        {
            if pre_material_id == post_material_id {
                return Ok(Self::quiet(BoundaryOutcome::SameMaterial));
            }
            match post_material.rindex(energy) {
                Some(rindex2) => interaction.rindex2 = rindex2,
                None => return Ok(Self::no_rindex(&post_material.name, energy)),
            }
        }

        interaction.run(rng);
        let outcome = interaction.into_outcome();
        trace!(
            status = %outcome.status(),
            direction = ?outcome.redirect().map(|r| r.momentum),
            "boundary"
        );
        Ok(outcome)
    }

    fn material_of<G: GeometryQuery + ?Sized>(
        geometry: &G,
        volume: VolumeId,
    ) -> Result<(MaterialId, &Material)> {
        let id = geometry.volume_material(volume).ok_or_else(|| {
            GeometryError::VolumeNotFound(geometry.volume_name(volume).unwrap_or("?").into())
        })?;
        let material = geometry
            .material(id)
            .ok_or_else(|| GeometryError::MaterialNotFound(format!("{id:?}")))?;
        Ok((id, material))
    }

    fn quiet(outcome: BoundaryOutcome) -> BoundaryOutcome {
        trace!(status = %outcome.status(), "boundary");
        outcome
    }

    fn no_rindex(name: &str, deposit: f64) -> BoundaryOutcome {
        warn!(material = name, "no RINDEX, photon absorbed");
        BoundaryOutcome::NoRindex { deposit }
    }
}

/// Reverses the exit normal so it points back into the pre-step volume,
/// against the incoming momentum.
fn oriented_normal(exit_normal: &Vector3, momentum: &Vector3) -> Vector3 {
    let n = -exit_normal;
    if momentum.dot(&n) > 0.0 {
        -n
    } else {
        n
    }
}
