//! Fresnel transmission and reflection between two dielectrics, including
//! the gap behind back-painted surfaces.

use std::mem;

use crate::math::{unit_or, Vector3, TOLERANCE};
use crate::optics::{SurfaceFinish, SurfaceModel};
use crate::random::RandomSource;

use super::interaction::{mirror, mirror_polarization, Interaction};
use super::outcome::BoundaryStatus;
use super::sampling::MAX_RESAMPLE;

/// Which side of the surface the photon is on, relative to where it
/// started, and whether the media are currently swapped.
#[derive(Debug, Clone, Copy, Default)]
struct Side {
    inside: bool,
    swapped: bool,
}

impl Interaction<'_> {
    pub(super) fn dielectric_dielectric<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        let mut side = Side::default();
        let mut bounces = 0;
        loop {
            self.fresnel(&mut side, rng);
            if self.status == BoundaryStatus::Absorption {
                return;
            }

            let in_gap = side.inside && !side.swapped && self.finish.is_back_painted();
            if !in_gap {
                return;
            }
            if !rng.bernoulli(self.reflectivity) {
                self.do_absorption(rng);
                return;
            }
            if bounces == self.max_paint_bounces {
                self.give_up("paint bounce limit reached");
                return;
            }
            bounces += 1;

            // Reflect off the paint and go back through the interface.
            if self.status == BoundaryStatus::FresnelRefraction {
                side.swapped = !side.swapped;
                self.swap_media();
            } else {
                self.global_normal = -self.global_normal;
            }
            if self.finish == SurfaceFinish::GroundBackPainted {
                self.status = BoundaryStatus::LambertianReflection;
            }
            self.do_reflection(rng);
            self.global_normal = -self.global_normal;
            self.old_momentum = self.new_momentum;
            self.old_polarization = self.new_polarization;
        }
    }

    fn swap_media(&mut self) {
        mem::swap(&mut self.material1, &mut self.material2);
        mem::swap(&mut self.rindex1, &mut self.rindex2);
    }

    /// Reflects or refracts on (possibly rough) facets until the photon
    /// leaves the interface on the side matching its status.
    fn fresnel<R: RandomSource + ?Sized>(&mut self, side: &mut Side, rng: &mut R) {
        let mut through = false;
        for _ in 0..MAX_RESAMPLE {
            if through {
                side.swapped = !side.swapped;
                through = false;
                self.global_normal = -self.global_normal;
                self.swap_media();
            }

            self.facet_normal = if self.finish == SurfaceFinish::Polished {
                self.global_normal
            } else {
                self.sample_facet(rng)
            };

            self.cost1 = -self.old_momentum.dot(&self.facet_normal);
            let sint2 = if self.cost1.abs() < 1.0 - TOLERANCE {
                self.sint1 = (1.0 - self.cost1 * self.cost1).sqrt();
                self.sint1 * self.rindex1 / self.rindex2
            } else {
                self.sint1 = 0.0;
                0.0
            };

            if sint2 >= 1.0 {
                side.swapped = false;
                self.status = BoundaryStatus::TotalInternalReflection;
                self.reflect_from_facet(rng);
            } else {
                through = self.transmit_or_reflect(sint2, rng);
                if through {
                    side.inside = !side.inside;
                } else {
                    side.swapped = false;
                }
            }

            self.old_momentum = unit_or(&self.new_momentum, &self.old_momentum);
            self.old_polarization = unit_or(&self.new_polarization, &self.old_polarization);

            let pn = self.new_momentum.dot(&self.global_normal);
            let done = if self.status == BoundaryStatus::FresnelRefraction {
                pn <= 0.0
            } else {
                pn >= 0.0
            };
            if done {
                return;
            }
        }
        self.give_up("Fresnel sampling did not leave the interface");
    }

    /// Reflection for rough unified surfaces may turn into any of the
    /// unified reflection types; otherwise it is specular on the facet.
    fn reflect_from_facet<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        if self.model == SurfaceModel::Unified && self.finish != SurfaceFinish::Polished {
            self.choose_reflection(rng);
        }
        match self.status {
            BoundaryStatus::LambertianReflection => self.do_reflection(rng),
            BoundaryStatus::BackScattering => self.back_scatter(),
            _ => {
                self.new_momentum = mirror(&self.old_momentum, &self.facet_normal);
                self.new_polarization =
                    mirror_polarization(&self.old_polarization, &self.facet_normal);
            }
        }
    }

    /// Fresnel amplitudes for `sin(theta_2) < 1`. Returns `true` if the
    /// photon is transmitted.
    fn transmit_or_reflect<R: RandomSource + ?Sized>(&mut self, sint2: f64, rng: &mut R) -> bool {
        let (n1, n2) = (self.rindex1, self.rindex2);
        let cost1 = self.cost1;
        let cost2 = if cost1 > 0.0 {
            (1.0 - sint2 * sint2).sqrt()
        } else {
            -(1.0 - sint2 * sint2).sqrt()
        };
        let oblique = self.sint1 > 0.0;

        let (a_trans, e1_perp, e1_parl) = if oblique {
            let a_trans = unit_or(
                &self.old_momentum.cross(&self.facet_normal),
                &self.old_polarization,
            );
            let e1_perp = self.old_polarization.dot(&a_trans);
            let e1_parl = (self.old_polarization - e1_perp * a_trans).norm();
            (a_trans, e1_perp, e1_parl)
        } else {
            // Normal incidence: the whole field counts as parallel.
            (self.old_polarization, 0.0, 1.0)
        };

        let s1 = n1 * cost1;
        let e2_perp = 2.0 * s1 * e1_perp / (n1 * cost1 + n2 * cost2);
        let e2_parl = 2.0 * s1 * e1_parl / (n2 * cost1 + n1 * cost2);
        let e2_total = e2_perp * e2_perp + e2_parl * e2_parl;
        let s2 = n2 * cost2 * e2_total;

        let trans_coeff = if self.transmittance > 0.0 {
            self.transmittance
        } else if cost1 != 0.0 {
            s2 / s1
        } else {
            0.0
        };

        if !rng.bernoulli(trans_coeff) {
            self.status = BoundaryStatus::FresnelReflection;
            if self.model == SurfaceModel::Unified && self.finish != SurfaceFinish::Polished {
                self.choose_reflection(rng);
            }
            match self.status {
                BoundaryStatus::LambertianReflection => self.do_reflection(rng),
                BoundaryStatus::BackScattering => self.back_scatter(),
                _ => {
                    self.new_momentum = mirror(&self.old_momentum, &self.facet_normal);
                    self.new_polarization = if oblique {
                        let r_parl = n2 * e2_parl / n1 - e1_parl;
                        let r_perp = e2_perp - e1_perp;
                        self.recompose(&a_trans, r_perp, r_parl)
                    } else if n2 > n1 {
                        -self.old_polarization
                    } else {
                        self.old_polarization
                    };
                }
            }
            false
        } else {
            self.status = BoundaryStatus::FresnelRefraction;
            if oblique {
                let alpha = cost1 - cost2 * (n2 / n1);
                self.new_momentum = unit_or(
                    &(self.old_momentum + alpha * self.facet_normal),
                    &self.old_momentum,
                );
                self.new_polarization = self.recompose(&a_trans, e2_perp, e2_parl);
            } else {
                self.new_momentum = self.old_momentum;
                self.new_polarization = self.old_polarization;
            }
            true
        }
    }

    /// Polarization from perpendicular and parallel amplitudes about the new
    /// momentum.
    fn recompose(&self, a_trans: &Vector3, perp: f64, parl: f64) -> Vector3 {
        let a_paral = unit_or(&self.new_momentum.cross(a_trans), a_trans);
        let abs = (perp * perp + parl * parl).sqrt();
        if abs == 0.0 {
            return self.old_polarization;
        }
        (parl / abs) * a_paral + (perp / abs) * a_trans
    }
}
