use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;

/// Named optical properties attached to materials and surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Rindex,
    Reflectivity,
    RealRindex,
    ImaginaryRindex,
    Efficiency,
    Transmittance,
    SpecularLobeConstant,
    SpecularSpikeConstant,
    BackscatterConstant,
    GroupVel,
}

impl PropertyKey {
    /// Conventional upper-case property name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rindex => "RINDEX",
            Self::Reflectivity => "REFLECTIVITY",
            Self::RealRindex => "REALRINDEX",
            Self::ImaginaryRindex => "IMAGINARYRINDEX",
            Self::Efficiency => "EFFICIENCY",
            Self::Transmittance => "TRANSMITTANCE",
            Self::SpecularLobeConstant => "SPECULARLOBECONSTANT",
            Self::SpecularSpikeConstant => "SPECULARSPIKECONSTANT",
            Self::BackscatterConstant => "BACKSCATTERCONSTANT",
            Self::GroupVel => "GROUPVEL",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property tabulated against photon energy.
///
/// Lookups interpolate linearly between samples and clamp to the first or
/// last value outside the tabulated range.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyVector {
    energies: Vec<f64>,
    values: Vec<f64>,
}

impl PropertyVector {
    /// Creates a tabulated property.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices are empty, differ in length, or the
    /// energies are not strictly increasing.
    pub fn new(energies: Vec<f64>, values: Vec<f64>) -> Result<Self, ConfigError> {
        if energies.is_empty() {
            return Err(ConfigError::Invalid("property vector is empty".into()));
        }
        if energies.len() != values.len() {
            return Err(ConfigError::Invalid(format!(
                "property vector has {} energies but {} values",
                energies.len(),
                values.len()
            )));
        }
        if energies.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::Invalid(
                "property energies must be strictly increasing".into(),
            ));
        }
        Ok(Self { energies, values })
    }

    /// A property with the same value at every energy.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            energies: vec![0.0],
            values: vec![value],
        }
    }

    /// Evaluates the property at `energy`.
    #[must_use]
    pub fn value(&self, energy: f64) -> f64 {
        let n = self.energies.len();
        if n == 1 || energy <= self.energies[0] {
            return self.values[0];
        }
        if energy >= self.energies[n - 1] {
            return self.values[n - 1];
        }
        let hi = self.energies.partition_point(|&e| e <= energy);
        let lo = hi - 1;
        let (e0, e1) = (self.energies[lo], self.energies[hi]);
        let (v0, v1) = (self.values[lo], self.values[hi]);
        v0 + (v1 - v0) * (energy - e0) / (e1 - e0)
    }
}

/// A set of energy-dependent properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTable {
    entries: HashMap<PropertyKey, PropertyVector>,
}

impl PropertyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property, returning the table.
    #[must_use]
    pub fn with(mut self, key: PropertyKey, vector: PropertyVector) -> Self {
        self.insert(key, vector);
        self
    }

    /// Adds or replaces a property.
    pub fn insert(&mut self, key: PropertyKey, vector: PropertyVector) {
        self.entries.insert(key, vector);
    }

    /// Returns the tabulated property, if present.
    #[must_use]
    pub fn get(&self, key: PropertyKey) -> Option<&PropertyVector> {
        self.entries.get(&key)
    }

    /// Evaluates a property at `energy`, if present.
    #[must_use]
    pub fn value(&self, key: PropertyKey, energy: f64) -> Option<f64> {
        self.get(key).map(|v| v.value(energy))
    }

    /// Returns `true` if the property is present.
    #[must_use]
    pub fn contains(&self, key: PropertyKey) -> bool {
        self.entries.contains_key(&key)
    }
}
