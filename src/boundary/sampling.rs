use std::f64::consts::{FRAC_PI_2, TAU};

use crate::math::{rotate_uz, Vector3};
use crate::optics::SurfaceModel;
use crate::random::RandomSource;

/// Rejection loops give up after this many tries.
pub(crate) const MAX_RESAMPLE: usize = 100_000;

/// Micro-facet roughness of a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roughness {
    pub model: SurfaceModel,
    pub sigma_alpha: f64,
    pub polish: f64,
}

impl Roughness {
    /// A perfectly smooth glisur surface.
    pub const SMOOTH: Self = Self {
        model: SurfaceModel::Glisur,
        sigma_alpha: 0.0,
        polish: 1.0,
    };
}

/// Samples the facet normal seen by a photon moving along `momentum`
/// onto a surface with average normal `normal`.
///
/// The returned facet always faces the photon (`momentum . facet < 0`).
/// Unified and LUT models tilt the normal by `alpha ~ g(alpha; 0, sigma) sin(alpha)`;
/// glisur smears it by `(1 - polish)` times a random point in the unit ball.
/// Falls back to `normal` if no facing facet is found within [`MAX_RESAMPLE`] tries.
pub fn facet_normal<R: RandomSource + ?Sized>(
    roughness: &Roughness,
    momentum: &Vector3,
    normal: &Vector3,
    rng: &mut R,
) -> Vector3 {
    match roughness.model {
        SurfaceModel::Unified | SurfaceModel::Lut => {
            let sigma = roughness.sigma_alpha;
            if sigma == 0.0 {
                return *normal;
            }
            let f_max = (4.0 * sigma).min(1.0);
            for _ in 0..MAX_RESAMPLE {
                let alpha = sample_alpha(sigma, f_max, rng);
                let phi = rng.uniform() * TAU;
                let (sin_a, cos_a) = alpha.sin_cos();
                let local = Vector3::new(sin_a * phi.cos(), sin_a * phi.sin(), cos_a);
                let facet = rotate_uz(&local, normal);
                if momentum.dot(&facet) < 0.0 {
                    return facet;
                }
            }
            *normal
        }
        SurfaceModel::Glisur => {
            let polish = roughness.polish;
            if polish >= 1.0 {
                return *normal;
            }
            for _ in 0..MAX_RESAMPLE {
                let smear = point_in_unit_ball(rng) * (1.0 - polish);
                let facet = normal + smear;
                if momentum.dot(&facet) < 0.0 {
                    return facet.try_normalize(0.0).unwrap_or(*normal);
                }
            }
            *normal
        }
    }
}

fn sample_alpha<R: RandomSource + ?Sized>(sigma: f64, f_max: f64, rng: &mut R) -> f64 {
    for _ in 0..MAX_RESAMPLE {
        let alpha = rng.gaussian(0.0, sigma);
        if rng.uniform() * f_max <= alpha.sin() && alpha < FRAC_PI_2 {
            return alpha;
        }
    }
    0.0
}

/// Uniform random point inside the unit ball.
pub fn point_in_unit_ball<R: RandomSource + ?Sized>(rng: &mut R) -> Vector3 {
    for _ in 0..MAX_RESAMPLE {
        let v = Vector3::new(
            2.0 * rng.uniform() - 1.0,
            2.0 * rng.uniform() - 1.0,
            2.0 * rng.uniform() - 1.0,
        );
        if v.norm_squared() <= 1.0 {
            return v;
        }
    }
    Vector3::zeros()
}

/// Isotropic unit vector from `cos(theta)` and `phi`.
pub fn isotropic_direction<R: RandomSource + ?Sized>(rng: &mut R) -> Vector3 {
    let cos_t = 2.0 * rng.uniform() - 1.0;
    let sin_t = (1.0 - cos_t * cos_t).max(0.0).sqrt();
    let phi = TAU * rng.uniform();
    Vector3::new(sin_t * phi.cos(), sin_t * phi.sin(), cos_t)
}

/// Isotropic unit vector by rejection inside the cube `[-1, 1)^3`.
///
/// Points with squared norm `>= 1` (or exactly at the origin) are
/// discarded and survivors normalized.
pub fn cube_rejection_direction<R: RandomSource + ?Sized>(rng: &mut R) -> Vector3 {
    for _ in 0..MAX_RESAMPLE {
        let v = Vector3::new(
            2.0 * rng.uniform() - 1.0,
            2.0 * rng.uniform() - 1.0,
            2.0 * rng.uniform() - 1.0,
        );
        let sq = v.norm_squared();
        if sq < 1.0 && sq > 0.0 {
            return v / sq.sqrt();
        }
    }
    isotropic_direction(rng)
}

/// Cosine-law (Lambertian) direction about `normal`, by rejection on
/// isotropic directions folded into the normal's hemisphere.
pub fn lambertian_direction<R: RandomSource + ?Sized>(normal: &Vector3, rng: &mut R) -> Vector3 {
    for _ in 0..MAX_RESAMPLE {
        let mut v = isotropic_direction(rng);
        let mut ndotv = normal.dot(&v);
        if ndotv < 0.0 {
            v = -v;
            ndotv = -ndotv;
        }
        if rng.uniform() < ndotv {
            return v;
        }
    }
    *normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{SequenceRandom, StdRandom};
    use approx::assert_relative_eq;

    #[test]
    fn smooth_surface_keeps_normal() {
        let mut rng = StdRandom::seed_from_u64(1);
        let n = Vector3::z();
        let p = -Vector3::z();
        assert_eq!(facet_normal(&Roughness::SMOOTH, &p, &n, &mut rng), n);
        let unified = Roughness {
            model: SurfaceModel::Unified,
            sigma_alpha: 0.0,
            polish: 1.0,
        };
        assert_eq!(facet_normal(&unified, &p, &n, &mut rng), n);
    }

    #[test]
    fn rough_facets_face_the_photon() {
        let mut rng = StdRandom::seed_from_u64(2);
        let n = Vector3::new(0.0, 0.0, 1.0);
        let p = Vector3::new(0.6, 0.0, -0.8);
        for roughness in [
            Roughness {
                model: SurfaceModel::Unified,
                sigma_alpha: 0.3,
                polish: 1.0,
            },
            Roughness {
                model: SurfaceModel::Glisur,
                sigma_alpha: 0.0,
                polish: 0.2,
            },
        ] {
            for _ in 0..500 {
                let f = facet_normal(&roughness, &p, &n, &mut rng);
                assert!(p.dot(&f) < 0.0);
                assert_relative_eq!(f.norm(), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn cube_rejection_discards_outside_points() {
        // First triple maps to (1, 1, 1) - rejected; second to (0.5, 0, 0).
        let mut rng = SequenceRandom::new(vec![1.0, 1.0, 1.0, 0.75, 0.5, 0.5]);
        let d = cube_rejection_direction(&mut rng);
        assert_relative_eq!(d, Vector3::x());
        assert_eq!(rng.draws(), 6);
    }

    #[test]
    fn isotropic_directions_are_unit() {
        let mut rng = StdRandom::seed_from_u64(3);
        let mut mean = Vector3::zeros();
        for _ in 0..5000 {
            let d = cube_rejection_direction(&mut rng);
            assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-12);
            mean += d;
        }
        assert!((mean / 5000.0).norm() < 0.05);
    }

    #[test]
    fn lambertian_stays_in_hemisphere() {
        let mut rng = StdRandom::seed_from_u64(4);
        let n = Vector3::new(0.0, 1.0, 0.0);
        let mut cos_sum = 0.0;
        for _ in 0..10_000 {
            let d = lambertian_direction(&n, &mut rng);
            assert!(d.dot(&n) >= 0.0);
            cos_sum += d.dot(&n);
        }
        // E[cos] = 2/3 for a cosine-law distribution
        assert!((cos_sum / 10_000.0 - 2.0 / 3.0).abs() < 0.02);
    }

    #[test]
    fn unit_ball_points_inside() {
        let mut rng = StdRandom::seed_from_u64(5);
        for _ in 0..1000 {
            assert!(point_in_unit_ball(&mut rng).norm() <= 1.0);
        }
    }
}
