use crate::math::{Point3, Vector3};
use crate::optics::MaterialId;

use super::shape::Shape;

slotmap::new_key_type! {
    /// Stable handle of a physical volume in the geometry store.
    pub struct VolumeId;
}

/// A placed volume.
///
/// `translation` is the global position of the volume's local origin;
/// volumes are never rotated.
#[derive(Debug, Clone)]
pub struct PhysicalVolume {
    pub name: String,
    pub material: MaterialId,
    pub shape: Shape,
    pub translation: Vector3,
    /// Enclosing volume, `None` for the world.
    pub mother: Option<VolumeId>,
    /// Copy (replica) number.
    pub copy_no: i32,
}

impl PhysicalVolume {
    /// Creates an unplaced volume at the origin with copy number 0.
    #[must_use]
    pub fn new(name: impl Into<String>, material: MaterialId, shape: Shape) -> Self {
        Self {
            name: name.into(),
            material,
            shape,
            translation: Vector3::zeros(),
            mother: None,
            copy_no: 0,
        }
    }

    /// Places the volume inside `mother` at `translation`.
    #[must_use]
    pub fn placed_in(mut self, mother: VolumeId, translation: Vector3) -> Self {
        self.mother = Some(mother);
        self.translation = translation;
        self
    }

    /// Sets the copy number.
    #[must_use]
    pub fn with_copy_no(mut self, copy_no: i32) -> Self {
        self.copy_no = copy_no;
        self
    }

    /// Converts a global point into the local frame.
    #[must_use]
    pub fn to_local(&self, point: &Point3) -> Point3 {
        point - self.translation
    }

    /// Outward normal at a global point on the surface.
    #[must_use]
    pub fn outward_normal(&self, point: &Point3) -> Option<Vector3> {
        self.shape.outward_normal(&self.to_local(point))
    }
}
