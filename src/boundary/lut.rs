use tracing::warn;

use crate::math::{orthogonal, rotate_about, unit_or, TOLERANCE};
use crate::optics::{AngularLut, SurfaceFinish};
use crate::random::RandomSource;

use super::interaction::{mirror_polarization, Interaction};
use super::outcome::BoundaryStatus;
use super::sampling::MAX_RESAMPLE;

impl Interaction<'_> {
    /// Reflection sampled from a measured angular distribution.
    pub(super) fn dielectric_lut<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        let lut = self.surface.and_then(|s| s.angular_lut.as_ref());
        let (Some(lut), SurfaceFinish::Lut(finish)) = (lut, self.finish) else {
            warn!(
                surface = self.surface.map_or("", |s| s.name.as_str()),
                "LUT surface without a measured finish and table"
            );
            self.do_absorption(rng);
            return;
        };
        self.status = BoundaryStatus::LutReflection(finish);

        for _ in 0..MAX_RESAMPLE {
            if !rng.bernoulli(self.reflectivity) {
                self.do_absorption(rng);
                return;
            }
            let Some((theta, phi)) = self.sample_lut_angles(lut, rng) else {
                self.give_up("no LUT bin accepted");
                return;
            };

            let angle = self.old_momentum.angle(&-self.global_normal);
            let reversed = -self.old_momentum;
            let mut axis_theta = reversed.cross(&self.global_normal);
            if axis_theta.norm() <= TOLERANCE {
                axis_theta = orthogonal(&reversed);
            }
            let axis_phi = axis_theta.cross(&reversed);

            let turned = rotate_about(&reversed, angle - theta, &axis_theta);
            self.new_momentum = rotate_about(&turned, -phi, &axis_phi);

            self.facet_normal = unit_or(
                &(self.new_momentum - self.old_momentum),
                &self.global_normal,
            );
            self.new_polarization = mirror_polarization(&self.old_polarization, &self.facet_normal);

            if self.new_momentum.dot(&self.global_normal) > 0.0 {
                return;
            }
        }
        self.give_up("LUT reflection did not leave the surface");
    }

    /// Draws `(theta, phi)` in radians by rejection against the tabulated
    /// probability for the rounded incident angle.
    fn sample_lut_angles<R: RandomSource + ?Sized>(
        &self,
        lut: &AngularLut,
        rng: &mut R,
    ) -> Option<(f64, f64)> {
        let angle = self.old_momentum.angle(&-self.global_normal);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let incident = (angle.to_degrees() + 0.5).floor().max(0.0) as usize;
        let theta_max = lut.theta_bins().saturating_sub(1);
        let phi_max = lut.phi_bins().saturating_sub(1);

        for _ in 0..MAX_RESAMPLE {
            let theta_index = rng.uniform_int(theta_max);
            let phi_index = rng.uniform_int(phi_max);
            if rng.bernoulli(lut.value(incident, theta_index, phi_index)) {
                #[allow(clippy::cast_precision_loss)]
                let theta = (-90.0 + 4.0 * theta_index as f64).to_radians();
                #[allow(clippy::cast_precision_loss)]
                let phi = (-90.0 + 5.0 * phi_index as f64).to_radians();
                return Some((theta, phi));
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::interaction::Incident;
    use super::*;
    use crate::math::Vector3;
    use crate::optics::{
        LutFinish, Material, OpticalSurface, PropertyKey, PropertyTable, PropertyVector,
        SurfaceModel, SurfaceType,
    };
    use crate::random::{SequenceRandom, StdRandom};
    use approx::assert_relative_eq;

    fn lut_surface(reflectivity: f64) -> OpticalSurface {
        // 46 polar x 37 azimuthal bins, uniform acceptance.
        let lut = AngularLut::new(46, 37, vec![0.5; 91 * 46 * 37]).unwrap();
        OpticalSurface::new(
            "lut",
            SurfaceType::DielectricLut,
            SurfaceModel::Lut,
            SurfaceFinish::Lut(LutFinish::GroundTeflonAir),
        )
        .with_properties(
            PropertyTable::new()
                .with(PropertyKey::Reflectivity, PropertyVector::constant(reflectivity)),
        )
        .with_angular_lut(lut)
    }

    fn incident() -> Incident {
        let (s, c) = 0.6_f64.sin_cos();
        Incident {
            energy: 3e-6,
            momentum: Vector3::new(s, 0.0, c),
            polarization: Vector3::y(),
            normal: -Vector3::z(),
        }
    }

    #[test]
    fn reflection_leaves_the_surface() {
        let m = Material::opaque("Scint");
        let s = lut_surface(1.0);
        let mut rng = StdRandom::seed_from_u64(21);
        for _ in 0..200 {
            let mut i = Interaction::new(incident(), &m, &m, 1.58, 4);
            assert!(i.with_surface(&s, &mut rng).is_none());
            i.run(&mut rng);
            assert_eq!(
                i.status,
                BoundaryStatus::LutReflection(LutFinish::GroundTeflonAir)
            );
            assert!(i.new_momentum.dot(&i.global_normal) > 0.0);
            assert_relative_eq!(i.new_momentum.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn unreflected_photon_is_absorbed() {
        let m = Material::opaque("Scint");
        let s = lut_surface(0.0);
        let mut i = Interaction::new(incident(), &m, &m, 1.58, 4);
        let mut rng = SequenceRandom::new(vec![0.5]);
        i.with_surface(&s, &mut rng);
        i.run(&mut rng);
        assert_eq!(i.status, BoundaryStatus::Absorption);
    }

    #[test]
    fn missing_table_absorbs() {
        let m = Material::opaque("Scint");
        let s = OpticalSurface::new(
            "bare",
            SurfaceType::DielectricLut,
            SurfaceModel::Lut,
            SurfaceFinish::Lut(LutFinish::PolishedAir),
        );
        let mut i = Interaction::new(incident(), &m, &m, 1.58, 4);
        let mut rng = SequenceRandom::new(vec![0.5]);
        i.with_surface(&s, &mut rng);
        i.run(&mut rng);
        assert_eq!(i.status, BoundaryStatus::Absorption);
    }
}
