use std::f64::consts::PI;

use crate::math::{unit_or, Complex, TOLERANCE};
use crate::optics::{SurfaceFinish, SurfaceModel};
use crate::random::RandomSource;

use super::interaction::{mirror, mirror_polarization, Interaction};
use super::outcome::BoundaryStatus;
use super::sampling::MAX_RESAMPLE;

impl Interaction<'_> {
    /// Reflection off a metal, repeated while the reflected photon still
    /// points into the surface.
    pub(super) fn dielectric_metal<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        for n in 1..=MAX_RESAMPLE {
            if n == 1 && !rng.bernoulli(self.reflectivity) {
                self.do_absorption(rng);
                return;
            }
            if let Some(index) = self.complex_index {
                if n > 1 {
                    self.calculate_reflectivity(index, rng);
                    if !rng.bernoulli(self.reflectivity) {
                        self.do_absorption(rng);
                        return;
                    }
                }
            }

            if self.model == SurfaceModel::Glisur || self.finish == SurfaceFinish::Polished {
                self.do_reflection(rng);
            } else {
                if n == 1 {
                    self.choose_reflection(rng);
                }
                match self.status {
                    BoundaryStatus::LambertianReflection => self.do_reflection(rng),
                    BoundaryStatus::BackScattering => self.back_scatter(),
                    _ => self.reflect_polarized(rng),
                }
            }

            self.old_momentum = self.new_momentum;
            self.old_polarization = self.new_polarization;

            if self.new_momentum.dot(&self.global_normal) >= 0.0 {
                return;
            }
        }
        self.give_up("metal reflection did not leave the surface");
    }

    /// Specular reflection on the facet keeping the selected TE / TM
    /// polarization component.
    fn reflect_polarized<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        if self.status == BoundaryStatus::LobeReflection && self.complex_index.is_none() {
            self.facet_normal = self.sample_facet(rng);
        }
        let facet = self.facet_normal;
        self.new_momentum = mirror(&self.old_momentum, &facet);

        let a_trans = if self.sint1 > 0.0 {
            unit_or(&self.old_momentum.cross(&facet), &self.old_polarization)
        } else {
            self.old_polarization
        };
        let a_paral = unit_or(&self.new_momentum.cross(&a_trans), &a_trans);

        self.new_polarization = match (self.te, self.tm) {
            (true, false) => -a_trans,
            (false, true) => -a_paral,
            _ => mirror_polarization(&self.old_polarization, &facet),
        };
    }

    /// Reflectivity of a metallic surface from its complex refractive index
    /// `(real, imaginary)`, for the current photon and facet.
    pub(super) fn calculate_reflectivity<R: RandomSource + ?Sized>(
        &mut self,
        (real, imaginary): (f64, f64),
        rng: &mut R,
    ) {
        self.facet_normal = if self.finish == SurfaceFinish::Ground {
            self.sample_facet(rng)
        } else {
            self.global_normal
        };

        let pdotn = self.old_momentum.dot(&self.facet_normal);
        self.cost1 = -pdotn;
        self.sint1 = if self.cost1.abs() < 1.0 - TOLERANCE {
            (1.0 - self.cost1 * self.cost1).sqrt()
        } else {
            0.0
        };

        let (e1_perp, e1_parl) = if self.sint1 > 0.0 {
            let a_trans = unit_or(
                &self.old_momentum.cross(&self.facet_normal),
                &self.old_polarization,
            );
            let perp = self.old_polarization.dot(&a_trans);
            (perp, (self.old_polarization - perp * a_trans).norm())
        } else {
            (0.0, 1.0)
        };

        let norms = self.old_momentum.norm() * self.facet_normal.norm();
        let incident = PI - (pdotn / norms).clamp(-1.0, 1.0).acos();

        let n = Complex::new(real, imaginary);
        let (r, r_te, r_tm) = fresnel_metal(e1_perp, e1_parl, incident, n);
        self.reflectivity = r;
        self.select_polarization(r, r_te, r_tm, rng);
    }

    /// Picks which of the TE / TM components survive the reflection,
    /// never dropping both.
    fn select_polarization<R: RandomSource + ?Sized>(
        &mut self,
        r: f64,
        r_te: f64,
        r_tm: f64,
        rng: &mut R,
    ) {
        for _ in 0..MAX_RESAMPLE {
            self.te = rng.uniform() * r <= r_te;
            self.tm = rng.uniform() * r <= r_tm;
            if self.te || self.tm {
                return;
            }
        }
        self.te = true;
        self.tm = true;
    }
}

/// Total, TE and TM reflectivity of a metal with complex index `n` for a
/// wave with the given perpendicular and parallel amplitudes hitting it at
/// `incident` radians (Fowles).
fn fresnel_metal(e1_perp: f64, e1_parl: f64, incident: f64, n: Complex) -> (f64, f64, f64) {
    let (sin_i, cos_i) = incident.sin_cos();
    let one = Complex::new(1.0, 0.0);
    let cos_i = Complex::new(cos_i, 0.0);
    let cos_phi = (one - Complex::new(sin_i * sin_i, 0.0) / (n * n)).sqrt();

    let r_te = (cos_i - n * cos_phi) / (cos_i + n * cos_phi);
    let r_tm = (n * cos_i - cos_phi) / (n * cos_i + cos_phi);

    let total = e1_perp * e1_perp + e1_parl * e1_parl;
    if total == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let te = r_te.norm_sqr() * e1_perp * e1_perp / total;
    let tm = r_tm.norm_sqr() * e1_parl * e1_parl / total;
    (te + tm, te, tm)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::interaction::Incident;
    use super::*;
    use crate::math::Vector3;
    use crate::optics::{
        Material, OpticalSurface, PropertyKey, PropertyTable, PropertyVector, SurfaceType,
    };
    use crate::random::{SequenceRandom, StdRandom};
    use approx::assert_relative_eq;

    fn incident(theta: f64) -> Incident {
        let (s, c) = theta.sin_cos();
        Incident {
            energy: 3e-6,
            momentum: Vector3::new(s, 0.0, c),
            polarization: Vector3::y(),
            normal: -Vector3::z(),
        }
    }

    fn metal(finish: SurfaceFinish, table: PropertyTable) -> OpticalSurface {
        OpticalSurface::new("metal", SurfaceType::DielectricMetal, SurfaceModel::Glisur, finish)
            .with_properties(table)
    }

    #[test]
    fn perfect_mirror_reflects_specularly() {
        let m = Material::opaque("LAr");
        let s = metal(
            SurfaceFinish::Polished,
            PropertyTable::new().with(PropertyKey::Reflectivity, PropertyVector::constant(1.0)),
        );
        let mut i = Interaction::new(incident(0.5), &m, &m, 1.2, 4);
        let mut rng = StdRandom::seed_from_u64(1);
        assert!(i.with_surface(&s, &mut rng).is_none());
        i.run(&mut rng);
        assert_eq!(i.status, BoundaryStatus::SpikeReflection);
        assert_relative_eq!(i.new_momentum.z, -(0.5_f64).cos(), epsilon = 1e-12);
        assert_relative_eq!(i.new_polarization.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn black_metal_absorbs_or_detects() {
        let m = Material::opaque("LAr");
        let s = metal(
            SurfaceFinish::Polished,
            PropertyTable::new()
                .with(PropertyKey::Reflectivity, PropertyVector::constant(0.0))
                .with(PropertyKey::Efficiency, PropertyVector::constant(0.5)),
        );
        let mut i = Interaction::new(incident(0.2), &m, &m, 1.2, 4);
        let mut rng = SequenceRandom::new(vec![0.3, 0.2]);
        i.with_surface(&s, &mut rng);
        i.run(&mut rng);
        assert_eq!(i.status, BoundaryStatus::Detection);
        assert_eq!(i.deposit, 3e-6);

        let mut i = Interaction::new(incident(0.2), &m, &m, 1.2, 4);
        let mut rng = SequenceRandom::new(vec![0.3, 0.9]);
        i.with_surface(&s, &mut rng);
        i.run(&mut rng);
        assert_eq!(i.status, BoundaryStatus::Absorption);
        assert_eq!(i.deposit, 0.0);
    }

    #[test]
    fn complex_index_reflectivity_in_unit_range() {
        let m = Material::opaque("LAr");
        let s = metal(
            SurfaceFinish::Polished,
            PropertyTable::new()
                .with(PropertyKey::RealRindex, PropertyVector::constant(1.5))
                .with(PropertyKey::ImaginaryRindex, PropertyVector::constant(3.0)),
        );
        let mut rng = StdRandom::seed_from_u64(4);
        for k in 0..10 {
            let mut i = Interaction::new(incident(0.1 * f64::from(k)), &m, &m, 1.2, 4);
            i.with_surface(&s, &mut rng);
            assert!((0.0..=1.0).contains(&i.reflectivity), "R = {}", i.reflectivity);
            assert!(i.te || i.tm);
        }
    }

    #[test]
    fn normal_incidence_matches_closed_form() {
        // R = ((n - 1)^2 + k^2) / ((n + 1)^2 + k^2)
        let (r, _, _) = fresnel_metal(0.0, 1.0, 0.0, Complex::new(1.5, 3.0));
        assert_relative_eq!(r, (0.25 + 9.0) / (6.25 + 9.0), epsilon = 1e-12);
    }
}
