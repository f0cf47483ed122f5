//! Optical constants of materials and surfaces.

mod material;
mod property;
mod surface;

pub use material::{Material, MaterialId};
pub use property::{PropertyKey, PropertyTable, PropertyVector};
pub use surface::{
    AngularLut, LutFinish, OpticalSurface, SurfaceFinish, SurfaceId, SurfaceModel, SurfaceType,
};
