use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UnknownCrateReferenceError;

/// A crate is identified by its unique package name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CrateId(pub String);

impl CrateId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DepKind {
    Normal,
    Dev,
    Build,
}

impl Default for DepKind {
    fn default() -> Self {
        DepKind::Normal
    }
}

/// One outgoing dependency edge. Kept in a set, so repeating the same
/// target with the same kind collapses to a single edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct DepEntry {
    pub name: CrateId,
    #[serde(default)]
    pub kind: DepKind,
}

/// A single feature flag on a crate.
///
/// `forwards` holds `"target-crate/feature"` propagation declarations:
/// activating this feature also activates the named feature on the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureFlag {
    #[serde(default)]
    pub defines: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub forwards: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrateInfo {
    #[serde(default)]
    pub dependencies: BTreeSet<DepEntry>,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureFlag>,
}

/// Immutable-per-run snapshot of the workspace: every crate with its
/// direct dependency edges and feature table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Universe {
    crates: BTreeMap<CrateId, CrateInfo>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert. Returns true if the crate was newly added.
    pub fn add_crate(&mut self, name: &str) -> bool {
        use std::collections::btree_map::Entry;

        match self.crates.entry(CrateId::new(name)) {
            Entry::Vacant(e) => {
                e.insert(CrateInfo::default());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Add a dependency edge. Duplicate edges of the same kind collapse.
    /// The `from` crate must already exist; a dangling `to` endpoint is
    /// caught by [`Universe::validate`].
    pub fn add_dependency(&mut self, from: &str, to: &str, kind: DepKind) -> bool {
        let Some(info) = self.crates.get_mut(&CrateId::new(from)) else {
            return false;
        };
        info.dependencies.insert(DepEntry {
            name: CrateId::new(to),
            kind,
        })
    }

    pub fn set_feature(&mut self, krate: &str, feature: &str, defines: bool, enabled: bool) {
        if let Some(info) = self.crates.get_mut(&CrateId::new(krate)) {
            let flag = info.features.entry(feature.to_string()).or_default();
            flag.defines = defines;
            flag.enabled = enabled;
        }
    }

    /// Declare that activating `feature` on `krate` forwards to `target`
    /// (a `"crate/feature"` string).
    pub fn add_forward(&mut self, krate: &str, feature: &str, target: &str) {
        if let Some(info) = self.crates.get_mut(&CrateId::new(krate)) {
            info.features
                .entry(feature.to_string())
                .or_default()
                .forwards
                .insert(target.to_string());
        }
    }

    pub fn get(&self, id: &CrateId) -> Option<&CrateInfo> {
        self.crates.get(id)
    }

    pub fn contains(&self, id: &CrateId) -> bool {
        self.crates.contains_key(id)
    }

    pub fn crate_ids(&self) -> impl Iterator<Item = &CrateId> {
        self.crates.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CrateId, &CrateInfo)> {
        self.crates.iter()
    }

    pub fn len(&self) -> usize {
        self.crates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crates.is_empty()
    }

    /// Check that every dependency edge points at a crate present in the
    /// universe.
    pub fn validate(&self) -> Result<(), UnknownCrateReferenceError> {
        for info in self.crates.values() {
            for dep in &info.dependencies {
                if !self.crates.contains_key(&dep.name) {
                    return Err(UnknownCrateReferenceError {
                        name: dep.name.0.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_crate_idempotent() {
        let mut universe = Universe::new();
        assert!(universe.add_crate("sp-core"));
        assert!(!universe.add_crate("sp-core"));
        assert_eq!(universe.len(), 1);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");
        universe.add_crate("sp-io");
        assert!(universe.add_dependency("sp-core", "sp-io", DepKind::Normal));
        assert!(!universe.add_dependency("sp-core", "sp-io", DepKind::Normal));
        assert!(universe.add_dependency("sp-core", "sp-io", DepKind::Dev));

        let info = universe.get(&CrateId::new("sp-core")).unwrap();
        assert_eq!(info.dependencies.len(), 2);
    }

    #[test]
    fn validate_rejects_dangling_edge() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");
        universe.add_dependency("sp-core", "missing", DepKind::Normal);
        let err = universe.validate().unwrap_err();
        assert_eq!(err.name, "missing");
    }

    #[test]
    fn universe_deserializes_collaborator_format() {
        let input = r#"{
            "sp-core": {
                "dependencies": [{ "name": "sp-io", "kind": "normal" }],
                "features": {
                    "std": { "defines": true, "enabled": true, "forwards": ["sp-io/std"] }
                }
            },
            "sp-io": {
                "features": { "std": { "defines": true } }
            }
        }"#;
        let universe: Universe = serde_json::from_str(input).expect("deserialize universe");
        assert!(universe.validate().is_ok());
        let core = universe.get(&CrateId::new("sp-core")).unwrap();
        assert!(core.features["std"].forwards.contains("sp-io/std"));
        assert!(!universe.get(&CrateId::new("sp-io")).unwrap().features["std"].enabled);
    }
}
