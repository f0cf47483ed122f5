use serde::Deserialize;
use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::geometry::VolumeId;

/// Name reported for the region outside the world volume.
pub const OUTSIDE_NAME: &str = "NULL";

/// ID of a volume that is not recorded.
pub const UNRECORDED: i32 = -1;

/// Ordered `(pattern, replacement)` rules assigning integer IDs to volume
/// names. A pattern matches a name exactly; the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct VolumeIdRules {
    rules: Vec<(String, String)>,
}

impl VolumeIdRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. The replacement must parse as an integer other
    /// than 0 and -1 to take effect.
    #[must_use]
    pub fn with(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.push(pattern, replacement);
        self
    }

    pub fn push(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        self.rules.push((pattern.into(), replacement.into()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Replacement of the first rule matching `name`.
    #[must_use]
    pub fn replacement_for(&self, name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern == name)
            .map(|(_, replacement)| replacement.as_str())
    }
}

/// Cache of volume IDs, keyed by volume handle.
#[derive(Debug, Clone, Default)]
pub struct VolumeIdMap {
    ids: SecondaryMap<VolumeId, i32>,
    outside: Option<i32>,
}

impl VolumeIdMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every cached ID.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.outside = None;
    }

    /// Cached ID of a volume, if classified.
    #[must_use]
    pub fn get(&self, volume: Option<VolumeId>) -> Option<i32> {
        match volume {
            Some(v) => self.ids.get(v).copied(),
            None => self.outside,
        }
    }

    /// ID of `volume`, named `name` (`None` is outside the world).
    ///
    /// A non-zero cached ID is returned as is. Otherwise, if there are
    /// rules, the first one matching the name assigns the ID. A matching
    /// rule with a reserved or unparsable replacement leaves the volume at
    /// 0. A volume no rule matches gets [`UNRECORDED`] unless every step is
    /// recorded, in which case it stays 0. Without rules every volume is 0.
    pub fn classify(
        &mut self,
        volume: Option<VolumeId>,
        name: &str,
        rules: &VolumeIdRules,
        record_all_steps: bool,
    ) -> i32 {
        let cached = self.get(volume).unwrap_or(0);
        if cached != 0 || rules.is_empty() {
            return cached;
        }

        let mut id = 0;
        let replacement = rules.replacement_for(name);
        if let Some(replacement) = replacement {
            debug!(volume = name, replacement, "setting volume ID");
            match replacement.trim().parse::<i32>() {
                Ok(0 | UNRECORDED) => {
                    warn!(volume = name, replacement, "volume ID 0 and -1 are reserved");
                }
                Ok(parsed) => id = parsed,
                Err(err) => {
                    warn!(volume = name, replacement, %err, "volume ID is not an integer");
                }
            }
        }
        if replacement.is_none() && !record_all_steps {
            id = UNRECORDED;
        }

        match volume {
            Some(v) => {
                self.ids.insert(v, id);
            }
            None => self.outside = Some(id),
        }
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn volumes(n: usize) -> Vec<VolumeId> {
        let mut arena: SlotMap<VolumeId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn matched_volume_is_cached() {
        let v = volumes(1)[0];
        let rules = VolumeIdRules::new().with("innerShroud", "7");
        let mut map = VolumeIdMap::new();
        assert_eq!(map.classify(Some(v), "innerShroud", &rules, false), 7);
        assert_eq!(map.get(Some(v)), Some(7));
        // Reused without consulting the rules again.
        assert_eq!(map.classify(Some(v), "innerShroud", &VolumeIdRules::new().with("x", "3"), false), 7);
    }

    #[test]
    fn unmatched_volume_depends_on_record_all() {
        let vs = volumes(2);
        let rules = VolumeIdRules::new().with("innerShroud", "7");
        let mut map = VolumeIdMap::new();
        assert_eq!(map.classify(Some(vs[0]), "larVolume", &rules, false), UNRECORDED);
        assert_eq!(map.classify(Some(vs[1]), "larVolume", &rules, true), 0);
    }

    #[test]
    fn no_rules_leaves_everything_zero() {
        let v = volumes(1)[0];
        let mut map = VolumeIdMap::new();
        assert_eq!(map.classify(Some(v), "anything", &VolumeIdRules::new(), false), 0);
        assert_eq!(map.get(Some(v)), None);
    }

    #[test]
    fn first_rule_wins_and_reserved_ids_are_rejected() {
        let vs = volumes(3);
        let rules = VolumeIdRules::new()
            .with("pmt", "4")
            .with("pmt", "5")
            .with("zero", "0")
            .with("text", "seven");
        let mut map = VolumeIdMap::new();
        assert_eq!(map.classify(Some(vs[0]), "pmt", &rules, false), 4);
        assert_eq!(map.classify(Some(vs[1]), "zero", &rules, true), 0);
        assert_eq!(map.classify(Some(vs[2]), "text", &rules, true), 0);
    }

    #[test]
    fn rejected_replacement_leaves_volume_unclassified() {
        let vs = volumes(3);
        let rules = VolumeIdRules::new()
            .with("zero", "0")
            .with("minus", "-1")
            .with("text", "seven");
        let mut map = VolumeIdMap::new();
        assert_eq!(map.classify(Some(vs[0]), "zero", &rules, false), 0);
        assert_eq!(map.classify(Some(vs[1]), "minus", &rules, false), 0);
        assert_eq!(map.classify(Some(vs[2]), "text", &rules, false), 0);
        assert_eq!(map.get(Some(vs[2])), Some(0));
    }

    #[test]
    fn outside_world_uses_its_own_slot() {
        let rules = VolumeIdRules::new().with(OUTSIDE_NAME, "9");
        let mut map = VolumeIdMap::new();
        assert_eq!(map.classify(None, OUTSIDE_NAME, &rules, false), 9);
        map.clear();
        assert_eq!(map.get(None), None);
    }

    #[test]
    fn rules_deserialize_from_pairs() {
        let rules: VolumeIdRules =
            serde_json::from_str(r#"[["innerShroud", "1"], ["outerShroud", "2"]]"#).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.replacement_for("outerShroud"), Some("2"));
        assert_eq!(rules.replacement_for("larVolume"), None);
    }
}
