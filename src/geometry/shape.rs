use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Distance (mm) within which a point counts as lying on a shape's surface.
pub const ON_SURFACE: f64 = 1e-6;

/// Solid shape of a volume in its local frame.
///
/// All shapes are centred on the local origin; tubes run along local z.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box with the given half extents.
    Box { half: Vector3 },
    /// Cylindrical shell. `inner_radius` of zero gives a full cylinder.
    Tube {
        inner_radius: f64,
        outer_radius: f64,
        half_length: f64,
    },
}

impl Shape {
    /// Creates a box from its half extents.
    ///
    /// # Errors
    ///
    /// Returns an error if any half extent is not positive.
    pub fn cuboid(hx: f64, hy: f64, hz: f64) -> Result<Self> {
        if hx < TOLERANCE || hy < TOLERANCE || hz < TOLERANCE {
            return Err(GeometryError::Degenerate("box half extents must be positive".into()).into());
        }
        Ok(Self::Box {
            half: Vector3::new(hx, hy, hz),
        })
    }

    /// Creates a tube (cylindrical shell) along local z.
    ///
    /// # Errors
    ///
    /// Returns an error if the radii are not ordered `0 <= inner < outer`
    /// or the half length is not positive.
    pub fn tube(inner_radius: f64, outer_radius: f64, half_length: f64) -> Result<Self> {
        if inner_radius < 0.0 || outer_radius - inner_radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("tube radii must satisfy 0 <= inner < outer".into())
                    .into(),
            );
        }
        if half_length < TOLERANCE {
            return Err(
                GeometryError::Degenerate("tube half length must be positive".into()).into(),
            );
        }
        Ok(Self::Tube {
            inner_radius,
            outer_radius,
            half_length,
        })
    }

    /// Returns `true` if the local point is inside or on the shape.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        match self {
            Self::Box { half } => {
                p.x.abs() <= half.x + ON_SURFACE
                    && p.y.abs() <= half.y + ON_SURFACE
                    && p.z.abs() <= half.z + ON_SURFACE
            }
            Self::Tube {
                inner_radius,
                outer_radius,
                half_length,
            } => {
                let r = p.x.hypot(p.y);
                r >= inner_radius - ON_SURFACE
                    && r <= outer_radius + ON_SURFACE
                    && p.z.abs() <= half_length + ON_SURFACE
            }
        }
    }

    /// Outward unit normal at a local point on the surface.
    ///
    /// Returns `None` if the point is not on the surface, which the
    /// boundary process treats as an invalid normal.
    #[must_use]
    pub fn outward_normal(&self, p: &Point3) -> Option<Vector3> {
        if !self.contains(p) {
            return None;
        }
        match self {
            Self::Box { half } => {
                let gaps = [
                    (half.x - p.x.abs(), Vector3::x() * p.x.signum()),
                    (half.y - p.y.abs(), Vector3::y() * p.y.signum()),
                    (half.z - p.z.abs(), Vector3::z() * p.z.signum()),
                ];
                closest_face(&gaps)
            }
            Self::Tube {
                inner_radius,
                outer_radius,
                half_length,
            } => {
                let r = p.x.hypot(p.y);
                let mut gaps = vec![(half_length - p.z.abs(), Vector3::z() * p.z.signum())];
                if r > TOLERANCE {
                    let radial = Vector3::new(p.x / r, p.y / r, 0.0);
                    gaps.push((outer_radius - r, radial));
                    if *inner_radius > 0.0 {
                        gaps.push((r - inner_radius, -radial));
                    }
                }
                closest_face(&gaps)
            }
        }
    }
}

/// Picks the face whose distance is within tolerance and smallest.
fn closest_face(gaps: &[(f64, Vector3)]) -> Option<Vector3> {
    gaps.iter()
        .filter(|(gap, _)| gap.abs() <= ON_SURFACE)
        .min_by(|a, b| a.0.abs().total_cmp(&b.0.abs()))
        .map(|(_, n)| *n)
}
