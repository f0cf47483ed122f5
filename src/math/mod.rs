pub mod units;
mod vector;

pub use vector::{orthogonal, rotate_about, rotate_uz, unit_or};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Complex number type used for metallic refractive indices.
pub type Complex = nalgebra::Complex<f64>;

/// Geometric surface tolerance in millimetres.
pub const TOLERANCE: f64 = 1e-9;

/// `h * c` in MeV * mm.
pub const HC: f64 = std::f64::consts::TAU * 1.973_269_602e-10;

/// Converts a photon wavelength (mm) to its energy (MeV).
#[must_use]
pub fn wavelength_to_energy(wavelength: f64) -> f64 {
    HC / wavelength
}

/// Converts a photon energy (MeV) to its wavelength (mm).
#[must_use]
pub fn energy_to_wavelength(energy: f64) -> f64 {
    HC / energy
}
