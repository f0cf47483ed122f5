use tracing::warn;

use crate::math::{unit_or, Vector3};
use crate::optics::{
    Material, OpticalSurface, PropertyKey, SurfaceFinish, SurfaceModel, SurfaceType,
};
use crate::random::RandomSource;

use super::outcome::{BoundaryOutcome, BoundaryStatus, Redirect};
use super::sampling::{facet_normal, lambertian_direction, Roughness};

/// Photon state at the boundary, with the global normal already pointing
/// back into the pre-step volume.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Incident {
    pub energy: f64,
    pub momentum: Vector3,
    pub polarization: Vector3,
    pub normal: Vector3,
}

/// Working state of one boundary interaction.
///
/// Built per step, mutated by the surface-type solvers and finally turned
/// into a [`BoundaryOutcome`].
#[derive(Debug)]
pub(crate) struct Interaction<'a> {
    pub(super) energy: f64,
    pub(super) old_momentum: Vector3,
    pub(super) old_polarization: Vector3,
    pub(super) new_momentum: Vector3,
    pub(super) new_polarization: Vector3,
    pub(super) global_normal: Vector3,
    pub(super) facet_normal: Vector3,
    pub(super) material1: &'a Material,
    pub(super) material2: &'a Material,
    pub(super) rindex1: f64,
    pub(super) rindex2: f64,
    pub(super) surface: Option<&'a OpticalSurface>,
    pub(super) surface_type: SurfaceType,
    pub(super) model: SurfaceModel,
    pub(super) finish: SurfaceFinish,
    pub(super) reflectivity: f64,
    pub(super) efficiency: f64,
    pub(super) transmittance: f64,
    /// Specular lobe, specular spike and backscatter probabilities.
    pub(super) prob_sl: f64,
    pub(super) prob_ss: f64,
    pub(super) prob_bs: f64,
    /// Real and imaginary refractive index of a metallic surface.
    pub(super) complex_index: Option<(f64, f64)>,
    pub(super) te: bool,
    pub(super) tm: bool,
    pub(super) sint1: f64,
    pub(super) cost1: f64,
    pub(super) status: BoundaryStatus,
    pub(super) deposit: f64,
    pub(super) max_paint_bounces: u32,
}

impl<'a> Interaction<'a> {
    /// Interaction on a boundary without optical surface: a polished glisur
    /// dielectric pair with reflectivity 1.
    pub(crate) fn new(
        incident: Incident,
        material1: &'a Material,
        material2: &'a Material,
        rindex1: f64,
        max_paint_bounces: u32,
    ) -> Self {
        Self {
            energy: incident.energy,
            old_momentum: incident.momentum,
            old_polarization: incident.polarization,
            new_momentum: incident.momentum,
            new_polarization: incident.polarization,
            global_normal: incident.normal,
            facet_normal: incident.normal,
            material1,
            material2,
            rindex1,
            rindex2: rindex1,
            surface: None,
            surface_type: SurfaceType::DielectricDielectric,
            model: SurfaceModel::Glisur,
            finish: SurfaceFinish::Polished,
            reflectivity: 1.0,
            efficiency: 0.0,
            transmittance: 0.0,
            prob_sl: 0.0,
            prob_ss: 0.0,
            prob_bs: 0.0,
            complex_index: None,
            te: true,
            tm: true,
            sint1: 0.0,
            cost1: 0.0,
            status: BoundaryStatus::Undefined,
            deposit: 0.0,
            max_paint_bounces,
        }
    }

    /// Loads the optical surface between the two volumes.
    ///
    /// Returns an outcome when the surface alone decides the fate of the
    /// photon: a back-painted surface without a property table absorbs it,
    /// one without a gap `RINDEX` yields [`BoundaryOutcome::NoRindex`].
    pub(crate) fn with_surface<R: RandomSource + ?Sized>(
        &mut self,
        surface: &'a OpticalSurface,
        rng: &mut R,
    ) -> Option<BoundaryOutcome> {
        self.surface = Some(surface);
        self.surface_type = surface.surface_type;
        self.model = surface.model;
        self.finish = surface.finish;

        let e = self.energy;
        let Some(table) = surface.properties.as_ref() else {
            if self.finish.is_back_painted() {
                return Some(BoundaryOutcome::Absorption { deposit: e });
            }
            return None;
        };

        if self.finish.is_back_painted() {
            match table.value(PropertyKey::Rindex, e) {
                Some(gap) => self.rindex2 = gap,
                None => return Some(BoundaryOutcome::NoRindex { deposit: e }),
            }
        }

        self.complex_index = table
            .value(PropertyKey::RealRindex, e)
            .zip(table.value(PropertyKey::ImaginaryRindex, e));
        if let Some(r) = table.value(PropertyKey::Reflectivity, e) {
            self.reflectivity = r;
        } else if let Some(index) = self.complex_index {
            self.calculate_reflectivity(index, rng);
        }
        if let Some(eff) = table.value(PropertyKey::Efficiency, e) {
            self.efficiency = eff;
        }
        if let Some(t) = table.value(PropertyKey::Transmittance, e) {
            self.transmittance = t;
        }
        if self.model == SurfaceModel::Unified {
            self.prob_sl = table
                .value(PropertyKey::SpecularLobeConstant, e)
                .unwrap_or(0.0);
            self.prob_ss = table
                .value(PropertyKey::SpecularSpikeConstant, e)
                .unwrap_or(0.0);
            self.prob_bs = table
                .value(PropertyKey::BackscatterConstant, e)
                .unwrap_or(0.0);
        }
        None
    }

    /// Runs the solver for the surface type.
    pub(crate) fn run<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        match self.surface_type {
            SurfaceType::DielectricMetal => self.dielectric_metal(rng),
            SurfaceType::DielectricLut => self.dielectric_lut(rng),
            SurfaceType::DielectricDielectric => {
                if self.finish.is_back_painted() {
                    self.dielectric_dielectric(rng);
                } else if !rng.bernoulli(self.reflectivity) {
                    self.do_absorption(rng);
                } else if self.finish == SurfaceFinish::PolishedFrontPainted {
                    self.do_reflection(rng);
                } else if self.finish == SurfaceFinish::GroundFrontPainted {
                    self.status = BoundaryStatus::LambertianReflection;
                    self.do_reflection(rng);
                } else {
                    self.dielectric_dielectric(rng);
                }
            }
        }
    }

    /// Final outcome. Surviving directions are normalized.
    pub(crate) fn into_outcome(self) -> BoundaryOutcome {
        let redirect = Redirect::normalized(self.new_momentum, self.new_polarization);
        match self.status {
            BoundaryStatus::Absorption => BoundaryOutcome::Absorption {
                deposit: self.deposit,
            },
            BoundaryStatus::Detection => BoundaryOutcome::Detection {
                deposit: self.deposit,
            },
            BoundaryStatus::NoRindex => BoundaryOutcome::NoRindex {
                deposit: self.energy,
            },
            BoundaryStatus::FresnelRefraction => BoundaryOutcome::FresnelRefraction {
                redirect,
                group_velocity: self.material2.property(PropertyKey::GroupVel, self.energy),
            },
            BoundaryStatus::FresnelReflection => BoundaryOutcome::FresnelReflection(redirect),
            BoundaryStatus::TotalInternalReflection => {
                BoundaryOutcome::TotalInternalReflection(redirect)
            }
            BoundaryStatus::LambertianReflection => BoundaryOutcome::LambertianReflection(redirect),
            BoundaryStatus::LobeReflection => BoundaryOutcome::LobeReflection(redirect),
            BoundaryStatus::SpikeReflection => BoundaryOutcome::SpikeReflection(redirect),
            BoundaryStatus::BackScattering => BoundaryOutcome::BackScattering(redirect),
            BoundaryStatus::LutReflection(finish) => {
                BoundaryOutcome::LutReflection { finish, redirect }
            }
            BoundaryStatus::Undefined
            | BoundaryStatus::NotAtBoundary
            | BoundaryStatus::SameMaterial
            | BoundaryStatus::StepTooSmall
            | BoundaryStatus::WavelengthShift => BoundaryOutcome::Undefined,
        }
    }

    pub(super) fn roughness(&self) -> Roughness {
        match self.surface {
            Some(s) => Roughness {
                model: self.model,
                sigma_alpha: s.sigma_alpha,
                polish: s.polish,
            },
            None => Roughness::SMOOTH,
        }
    }

    pub(super) fn sample_facet<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Vector3 {
        facet_normal(
            &self.roughness(),
            &self.old_momentum,
            &self.global_normal,
            rng,
        )
    }

    /// Picks spike, lobe, backscatter or Lambertian reflection from the
    /// unified-model probabilities.
    pub(super) fn choose_reflection<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        let u = rng.uniform();
        let spike = self.prob_ss;
        let lobe = spike + self.prob_sl;
        let back = lobe + self.prob_bs;
        if u < spike {
            self.status = BoundaryStatus::SpikeReflection;
            self.facet_normal = self.global_normal;
        } else if u <= lobe {
            self.status = BoundaryStatus::LobeReflection;
        } else if u < back {
            self.status = BoundaryStatus::BackScattering;
        } else {
            self.status = BoundaryStatus::LambertianReflection;
        }
    }

    /// Absorbs the photon; detection with probability `efficiency`.
    pub(super) fn do_absorption<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        self.status = BoundaryStatus::Absorption;
        if rng.bernoulli(self.efficiency) {
            self.status = BoundaryStatus::Detection;
            self.deposit = self.energy;
        } else {
            self.deposit = 0.0;
        }
        self.new_momentum = self.old_momentum;
        self.new_polarization = self.old_polarization;
    }

    /// Lambertian if already chosen, lobe for ground finishes, spike
    /// otherwise. Polarization is mirrored about the facet normal.
    pub(super) fn do_reflection<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        if self.status == BoundaryStatus::LambertianReflection {
            self.new_momentum = lambertian_direction(&self.global_normal, rng);
            self.facet_normal =
                unit_or(&(self.new_momentum - self.old_momentum), &self.global_normal);
        } else if self.finish == SurfaceFinish::Ground {
            self.status = BoundaryStatus::LobeReflection;
            if self.complex_index.is_none() {
                self.facet_normal = self.sample_facet(rng);
            }
            self.new_momentum = mirror(&self.old_momentum, &self.facet_normal);
        } else {
            self.status = BoundaryStatus::SpikeReflection;
            self.facet_normal = self.global_normal;
            self.new_momentum = mirror(&self.old_momentum, &self.facet_normal);
        }
        self.new_polarization = mirror_polarization(&self.old_polarization, &self.facet_normal);
    }

    /// Reverses both momentum and polarization.
    pub(super) fn back_scatter(&mut self) {
        self.new_momentum = -self.old_momentum;
        self.new_polarization = -self.old_polarization;
    }

    /// Absorbs the photon after a solver ran out of attempts.
    pub(super) fn give_up(&mut self, reason: &str) {
        warn!(
            surface = self.surface.map_or("", |s| s.name.as_str()),
            reason, "photon absorbed"
        );
        self.status = BoundaryStatus::Absorption;
        self.deposit = 0.0;
        self.new_momentum = self.old_momentum;
        self.new_polarization = self.old_polarization;
    }
}

/// Specular reflection of `v` about the plane with normal `n`.
pub(super) fn mirror(v: &Vector3, n: &Vector3) -> Vector3 {
    v - 2.0 * v.dot(n) * n
}

/// Polarization after a mirror reflection on a facet with normal `n`.
pub(super) fn mirror_polarization(e: &Vector3, n: &Vector3) -> Vector3 {
    -e + 2.0 * e.dot(n) * n
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::optics::{PropertyTable, PropertyVector};
    use crate::random::SequenceRandom;
    use approx::assert_relative_eq;

    fn incident() -> Incident {
        Incident {
            energy: 3e-6,
            momentum: Vector3::new(0.0, 0.0, 1.0),
            polarization: Vector3::x(),
            normal: -Vector3::z(),
        }
    }

    #[test]
    fn mirror_reverses_normal_component() {
        let v = Vector3::new(1.0, 0.0, -1.0);
        assert_relative_eq!(mirror(&v, &Vector3::z()), Vector3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn choose_reflection_partitions_unit_interval() {
        let m = Material::opaque("m");
        let mut i = Interaction::new(incident(), &m, &m, 1.0, 4);
        i.prob_ss = 0.2;
        i.prob_sl = 0.3;
        i.prob_bs = 0.1;
        let cases = [
            (0.1, BoundaryStatus::SpikeReflection),
            (0.5, BoundaryStatus::LobeReflection),
            (0.55, BoundaryStatus::BackScattering),
            (0.9, BoundaryStatus::LambertianReflection),
        ];
        for (u, expected) in cases {
            let mut rng = SequenceRandom::new(vec![u]);
            i.choose_reflection(&mut rng);
            assert_eq!(i.status, expected, "u = {u}");
        }
    }

    #[test]
    fn absorption_detects_with_efficiency() {
        let m = Material::opaque("m");
        let mut i = Interaction::new(incident(), &m, &m, 1.0, 4);
        i.efficiency = 0.5;
        i.do_absorption(&mut SequenceRandom::new(vec![0.2]));
        assert_eq!(i.status, BoundaryStatus::Detection);
        assert_eq!(i.deposit, 3e-6);
        i.do_absorption(&mut SequenceRandom::new(vec![0.8]));
        assert_eq!(i.status, BoundaryStatus::Absorption);
        assert_eq!(i.deposit, 0.0);
    }

    #[test]
    fn back_painted_without_table_absorbs() {
        let m = Material::opaque("m");
        let mut i = Interaction::new(incident(), &m, &m, 1.0, 4);
        let s = OpticalSurface::new(
            "paint",
            SurfaceType::DielectricDielectric,
            SurfaceModel::Unified,
            SurfaceFinish::PolishedBackPainted,
        );
        let out = i.with_surface(&s, &mut SequenceRandom::new(vec![0.5]));
        assert_eq!(out, Some(BoundaryOutcome::Absorption { deposit: 3e-6 }));
    }

    #[test]
    fn back_painted_needs_gap_index() {
        let m = Material::opaque("m");
        let mut i = Interaction::new(incident(), &m, &m, 1.0, 4);
        let s = OpticalSurface::new(
            "paint",
            SurfaceType::DielectricDielectric,
            SurfaceModel::Unified,
            SurfaceFinish::GroundBackPainted,
        )
        .with_properties(
            PropertyTable::new().with(PropertyKey::Reflectivity, PropertyVector::constant(0.9)),
        );
        let out = i.with_surface(&s, &mut SequenceRandom::new(vec![0.5]));
        assert_eq!(out, Some(BoundaryOutcome::NoRindex { deposit: 3e-6 }));
    }

    #[test]
    fn unified_constants_loaded() {
        let m = Material::opaque("m");
        let mut i = Interaction::new(incident(), &m, &m, 1.0, 4);
        let s = OpticalSurface::new(
            "u",
            SurfaceType::DielectricDielectric,
            SurfaceModel::Unified,
            SurfaceFinish::Ground,
        )
        .with_properties(
            PropertyTable::new()
                .with(PropertyKey::SpecularLobeConstant, PropertyVector::constant(0.3))
                .with(PropertyKey::Efficiency, PropertyVector::constant(0.25)),
        );
        assert!(i.with_surface(&s, &mut SequenceRandom::new(vec![0.5])).is_none());
        assert_eq!(i.prob_sl, 0.3);
        assert_eq!(i.prob_ss, 0.0);
        assert_eq!(i.efficiency, 0.25);
        assert_eq!(i.reflectivity, 1.0);
    }
}
