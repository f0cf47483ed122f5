use super::property::{PropertyKey, PropertyTable};

slotmap::new_key_type! {
    /// Unique identifier for a material in the geometry store.
    pub struct MaterialId;
}

/// A bulk material and its optical properties.
///
/// A material without a property table behaves like one without `RINDEX`:
/// photons reaching a boundary inside it are absorbed.
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name; the wavelength shifter is identified by it.
    pub name: String,
    /// Optional energy-dependent properties.
    pub properties: Option<PropertyTable>,
}

impl Material {
    /// Creates a material with a property table.
    #[must_use]
    pub fn new(name: impl Into<String>, properties: PropertyTable) -> Self {
        Self {
            name: name.into(),
            properties: Some(properties),
        }
    }

    /// Creates a material with no optical properties.
    #[must_use]
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
        }
    }

    /// Looks up a property at the given photon energy.
    #[must_use]
    pub fn property(&self, key: PropertyKey, energy: f64) -> Option<f64> {
        self.properties.as_ref()?.value(key, energy)
    }

    /// Refractive index at the given photon energy.
    #[must_use]
    pub fn rindex(&self, energy: f64) -> Option<f64> {
        self.property(PropertyKey::Rindex, energy)
    }
}
