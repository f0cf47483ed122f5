use nalgebra::{Rotation3, Unit};

use super::Vector3;

/// Rotates `v`, expressed in a frame whose z axis is `new_z`, into the
/// global frame.
///
/// `new_z` must be a unit vector.
#[must_use]
pub fn rotate_uz(v: &Vector3, new_z: &Vector3) -> Vector3 {
    let (u1, u2, u3) = (new_z.x, new_z.y, new_z.z);
    let up = u1 * u1 + u2 * u2;
    if up > 0.0 {
        let up = up.sqrt();
        Vector3::new(
            (u1 * u3 * v.x - u2 * v.y) / up + u1 * v.z,
            (u2 * u3 * v.x + u1 * v.y) / up + u2 * v.z,
            -up * v.x + u3 * v.z,
        )
    } else if u3 < 0.0 {
        Vector3::new(-v.x, v.y, -v.z)
    } else {
        *v
    }
}

/// Returns a vector orthogonal to `v` built from its two largest components.
#[must_use]
pub fn orthogonal(v: &Vector3) -> Vector3 {
    let (x, y, z) = (v.x.abs(), v.y.abs(), v.z.abs());
    if x < y {
        if x < z {
            Vector3::new(0.0, v.z, -v.y)
        } else {
            Vector3::new(v.y, -v.x, 0.0)
        }
    } else if y < z {
        Vector3::new(-v.z, 0.0, v.x)
    } else {
        Vector3::new(v.y, -v.x, 0.0)
    }
}

/// Rotates `v` by `angle` (right-handed) about `axis`.
///
/// A zero-length axis leaves `v` unchanged.
#[must_use]
pub fn rotate_about(v: &Vector3, angle: f64, axis: &Vector3) -> Vector3 {
    match Unit::try_new(*axis, 0.0) {
        Some(axis) => Rotation3::from_axis_angle(&axis, angle) * v,
        None => *v,
    }
}

/// Normalizes `v`, falling back to `fallback` when `v` has zero length.
#[must_use]
pub fn unit_or(v: &Vector3, fallback: &Vector3) -> Vector3 {
    v.try_normalize(0.0).unwrap_or(*fallback)
}
