//! Detector geometry as seen by the photon transport core.
//!
//! The core only asks narrow questions of the geometry (names, materials,
//! exit normals, optical surfaces), collected in [`GeometryQuery`].
//! [`GeometryStore`] is an arena implementation of it.

mod shape;
mod volume;

pub use shape::{Shape, ON_SURFACE};
pub use volume::{PhysicalVolume, VolumeId};

use std::collections::HashMap;

use regex::Regex;
use slotmap::{SecondaryMap, SlotMap};

use crate::error::GeometryError;
use crate::math::{Point3, Vector3};
use crate::optics::{Material, MaterialId, OpticalSurface, SurfaceId};

/// Geometry and material queries needed by the boundary process and the
/// stepping dispatcher.
pub trait GeometryQuery {
    /// Name of a volume.
    fn volume_name(&self, volume: VolumeId) -> Option<&str>;

    /// Material filling a volume.
    fn volume_material(&self, volume: VolumeId) -> Option<MaterialId>;

    /// Material data.
    fn material(&self, id: MaterialId) -> Option<&Material>;

    /// Normal of the surface crossed when leaving `pre` for `post` at
    /// `point`, oriented along the direction of travel. `None` if the
    /// geometry cannot provide one.
    fn exit_normal(&self, pre: VolumeId, post: Option<VolumeId>, point: &Point3)
        -> Option<Vector3>;

    /// Optical surface between two volumes: a border surface for the
    /// ordered pair, else a skin surface of one of them.
    fn optical_surface(&self, pre: VolumeId, post: VolumeId) -> Option<&OpticalSurface>;

    /// Converts a global point into the volume's local frame.
    fn local_point(&self, volume: VolumeId, point: &Point3) -> Point3;

    /// Replica (copy) number of a volume.
    fn replica_number(&self, volume: VolumeId) -> i32;
}

/// Central arena that owns materials, volumes and optical surfaces.
#[derive(Debug, Default)]
pub struct GeometryStore {
    materials: SlotMap<MaterialId, Material>,
    volumes: SlotMap<VolumeId, PhysicalVolume>,
    surfaces: SlotMap<SurfaceId, OpticalSurface>,
    border_surfaces: HashMap<(VolumeId, VolumeId), SurfaceId>,
    skin_surfaces: SecondaryMap<VolumeId, SurfaceId>,
}

impl GeometryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Materials ---

    /// Inserts a material and returns its ID.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    /// Finds a material by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no material has this name.
    pub fn find_material(&self, name: &str) -> Result<MaterialId, GeometryError> {
        self.materials
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
            .ok_or_else(|| GeometryError::MaterialNotFound(name.into()))
    }

    // --- Volumes ---

    /// Inserts a volume and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume's material or mother is unknown.
    pub fn add_volume(&mut self, volume: PhysicalVolume) -> Result<VolumeId, GeometryError> {
        if !self.materials.contains_key(volume.material) {
            return Err(GeometryError::MaterialNotFound(format!(
                "material of volume {}",
                volume.name
            )));
        }
        if let Some(mother) = volume.mother {
            if !self.volumes.contains_key(mother) {
                return Err(GeometryError::VolumeNotFound(format!(
                    "mother of volume {}",
                    volume.name
                )));
            }
        }
        Ok(self.volumes.insert(volume))
    }

    /// Returns a reference to the volume, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume is not in the store.
    pub fn volume(&self, id: VolumeId) -> Result<&PhysicalVolume, GeometryError> {
        self.volumes
            .get(id)
            .ok_or_else(|| GeometryError::VolumeNotFound("volume".into()))
    }

    /// Finds a volume by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no volume has this name.
    pub fn find_volume(&self, name: &str) -> Result<VolumeId, GeometryError> {
        self.volumes
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(id, _)| id)
            .ok_or_else(|| GeometryError::VolumeNotFound(name.into()))
    }

    /// Lists `(name, copy number)` of every volume whose whole name
    /// matches the regular expression `pattern`. An empty pattern lists all.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidPattern`] if `pattern` does not
    /// compile.
    pub fn volumes_matching(&self, pattern: &str) -> Result<Vec<(String, i32)>, GeometryError> {
        let re = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("^(?:{pattern})$"))?)
        };
        Ok(self
            .volumes
            .values()
            .filter(|v| re.as_ref().is_none_or(|re| re.is_match(&v.name)))
            .map(|v| (v.name.clone(), v.copy_no))
            .collect())
    }

    /// Returns `true` if `child` is placed directly inside `parent`.
    #[must_use]
    pub fn is_daughter(&self, child: VolumeId, parent: VolumeId) -> bool {
        self.volumes
            .get(child)
            .is_some_and(|v| v.mother == Some(parent))
    }

    // --- Surfaces ---

    /// Inserts an optical surface and returns its ID.
    pub fn add_surface(&mut self, surface: OpticalSurface) -> SurfaceId {
        self.surfaces.insert(surface)
    }

    /// Attaches a surface to the ordered volume pair `(from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a volume or the surface is unknown.
    pub fn add_border_surface(
        &mut self,
        from: VolumeId,
        to: VolumeId,
        surface: SurfaceId,
    ) -> Result<(), GeometryError> {
        self.check_surface_target(surface, &[from, to])?;
        self.border_surfaces.insert((from, to), surface);
        Ok(())
    }

    /// Attaches a surface enclosing the whole volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the volume or the surface is unknown.
    pub fn add_skin_surface(
        &mut self,
        volume: VolumeId,
        surface: SurfaceId,
    ) -> Result<(), GeometryError> {
        self.check_surface_target(surface, &[volume])?;
        self.skin_surfaces.insert(volume, surface);
        Ok(())
    }

    fn check_surface_target(
        &self,
        surface: SurfaceId,
        volumes: &[VolumeId],
    ) -> Result<(), GeometryError> {
        if !self.surfaces.contains_key(surface) {
            return Err(GeometryError::SurfaceNotFound("surface".into()));
        }
        if volumes.iter().any(|v| !self.volumes.contains_key(*v)) {
            return Err(GeometryError::VolumeNotFound("surface target".into()));
        }
        Ok(())
    }

    fn skin(&self, volume: VolumeId) -> Option<&OpticalSurface> {
        self.skin_surfaces
            .get(volume)
            .and_then(|id| self.surfaces.get(*id))
    }
}

impl GeometryQuery for GeometryStore {
    fn volume_name(&self, volume: VolumeId) -> Option<&str> {
        self.volumes.get(volume).map(|v| v.name.as_str())
    }

    fn volume_material(&self, volume: VolumeId) -> Option<MaterialId> {
        self.volumes.get(volume).map(|v| v.material)
    }

    fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    fn exit_normal(
        &self,
        pre: VolumeId,
        post: Option<VolumeId>,
        point: &Point3,
    ) -> Option<Vector3> {
        // Entering a daughter crosses the daughter's surface inwards;
        // anything else leaves through the pre-step volume's own surface.
        match post {
            Some(post) if self.is_daughter(post, pre) => {
                self.volumes.get(post)?.outward_normal(point).map(|n| -n)
            }
            _ => self.volumes.get(pre)?.outward_normal(point),
        }
    }

    fn optical_surface(&self, pre: VolumeId, post: VolumeId) -> Option<&OpticalSurface> {
        if let Some(surface) = self
            .border_surfaces
            .get(&(pre, post))
            .and_then(|id| self.surfaces.get(*id))
        {
            return Some(surface);
        }
        if self.is_daughter(post, pre) {
            self.skin(post).or_else(|| self.skin(pre))
        } else {
            self.skin(pre).or_else(|| self.skin(post))
        }
    }

    fn local_point(&self, volume: VolumeId, point: &Point3) -> Point3 {
        self.volumes
            .get(volume)
            .map_or(*point, |v| v.to_local(point))
    }

    fn replica_number(&self, volume: VolumeId) -> i32 {
        self.volumes.get(volume).map_or(0, |v| v.copy_no)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::optics::{PropertyTable, SurfaceFinish, SurfaceModel, SurfaceType};

    fn world_with_daughter() -> (GeometryStore, VolumeId, VolumeId) {
        let mut g = GeometryStore::new();
        let lar = g.add_material(Material::new("LAr", PropertyTable::new()));
        let world = g
            .add_volume(PhysicalVolume::new(
                "larVolume",
                lar,
                Shape::cuboid(100.0, 100.0, 100.0).unwrap(),
            ))
            .unwrap();
        let shroud = g
            .add_volume(
                PhysicalVolume::new("innerShroud", lar, Shape::tube(10.0, 11.0, 50.0).unwrap())
                    .placed_in(world, Vector3::new(0.0, 0.0, 20.0))
                    .with_copy_no(3),
            )
            .unwrap();
        (g, world, shroud)
    }

    fn surface(name: &str) -> OpticalSurface {
        OpticalSurface::new(
            name,
            SurfaceType::DielectricDielectric,
            SurfaceModel::Glisur,
            SurfaceFinish::Polished,
        )
    }

    #[test]
    fn exit_normal_leaving_mother() {
        let (g, world, _) = world_with_daughter();
        let n = g
            .exit_normal(world, None, &Point3::new(100.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(n, Vector3::x());
    }

    #[test]
    fn exit_normal_entering_daughter_points_inward() {
        let (g, world, shroud) = world_with_daughter();
        let n = g
            .exit_normal(world, Some(shroud), &Point3::new(11.0, 0.0, 20.0))
            .unwrap();
        assert!((n + Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn exit_normal_off_surface_is_invalid() {
        let (g, world, _) = world_with_daughter();
        assert!(g.exit_normal(world, None, &Point3::origin()).is_none());
    }

    #[test]
    fn border_surface_takes_precedence() {
        let (mut g, world, shroud) = world_with_daughter();
        let skin = g.add_surface(surface("skin"));
        let border = g.add_surface(surface("border"));
        g.add_skin_surface(shroud, skin).unwrap();
        g.add_border_surface(world, shroud, border).unwrap();
        assert_eq!(g.optical_surface(world, shroud).unwrap().name, "border");
        assert_eq!(g.optical_surface(shroud, world).unwrap().name, "skin");
    }

    #[test]
    fn skin_surface_of_entered_daughter() {
        let (mut g, world, shroud) = world_with_daughter();
        let skin = g.add_surface(surface("skin"));
        g.add_skin_surface(shroud, skin).unwrap();
        assert_eq!(g.optical_surface(world, shroud).unwrap().name, "skin");
    }

    #[test]
    fn local_frame_and_replica() {
        let (g, _, shroud) = world_with_daughter();
        let local = g.local_point(shroud, &Point3::new(1.0, 2.0, 23.0));
        assert_eq!(local, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(g.replica_number(shroud), 3);
    }

    #[test]
    fn unknown_material_rejected() {
        let mut g = GeometryStore::new();
        let mut other = GeometryStore::new();
        other.add_material(Material::opaque("x"));
        let foreign = other.add_material(Material::opaque("y"));
        let res = g.add_volume(PhysicalVolume::new(
            "v",
            foreign,
            Shape::cuboid(1.0, 1.0, 1.0).unwrap(),
        ));
        assert!(matches!(res, Err(GeometryError::MaterialNotFound(_))));
    }

    #[test]
    fn find_by_name() {
        let (g, world, _) = world_with_daughter();
        assert_eq!(g.find_volume("larVolume").unwrap(), world);
        assert!(g.find_volume("nope").is_err());
        assert!(g.find_material("LAr").is_ok());
    }

    #[test]
    fn regex_listing() {
        let (g, _, _) = world_with_daughter();
        assert_eq!(g.volumes_matching("").unwrap().len(), 2);
        let shrouds = g.volumes_matching("inner.*").unwrap();
        assert_eq!(shrouds, vec![("innerShroud".to_string(), 3)]);
        assert_eq!(g.volumes_matching(".*Shroud").unwrap(), shrouds);
        assert_eq!(g.volumes_matching("lar.olume|nothing").unwrap().len(), 1);
        // Whole-name match only.
        assert!(g.volumes_matching("inner").unwrap().is_empty());
        assert!(g.volumes_matching("outer.*").unwrap().is_empty());
        assert!(matches!(
            g.volumes_matching("inner(").unwrap_err(),
            GeometryError::InvalidPattern(_)
        ));
    }
}
