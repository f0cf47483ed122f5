//! Internal unit system: millimetre, nanosecond, MeV.

pub const NM: f64 = 1e-6;

pub const EV: f64 = 1e-6;

/// Speed of light in mm/ns.
pub const C_LIGHT: f64 = 299.792_458;
