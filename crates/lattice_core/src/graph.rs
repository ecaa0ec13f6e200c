use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::universe::{CrateId, Universe};

/// A feature on a specific crate, the node type of the implication graph.
type FeatureNode = (CrateId, String);

/// Reachability index over the universe's dependency edges and feature
/// forwarding entries, built once per run. Edge kinds are not
/// distinguished here; the model keeps them so a future rule vocabulary
/// can scope queries per kind.
#[derive(Debug, Clone)]
pub struct DepGraph {
    direct: BTreeMap<CrateId, BTreeSet<CrateId>>,
    reachable: BTreeMap<CrateId, BTreeSet<CrateId>>,
    feature_edges: BTreeMap<FeatureNode, BTreeSet<FeatureNode>>,
}

impl DepGraph {
    pub fn build(universe: &Universe) -> Self {
        let mut direct: BTreeMap<CrateId, BTreeSet<CrateId>> = BTreeMap::new();
        for (id, info) in universe.iter() {
            let targets = info.dependencies.iter().map(|d| d.name.clone()).collect();
            direct.insert(id.clone(), targets);
        }

        // Activation graph over (crate, feature) nodes. A forwarding entry
        // "other/g" under feature f points across crates; a bare entry "g"
        // activates a sibling feature of the same crate.
        let mut feature_edges: BTreeMap<FeatureNode, BTreeSet<FeatureNode>> = BTreeMap::new();
        for (id, info) in universe.iter() {
            for (name, flag) in &info.features {
                let source = (id.clone(), name.clone());
                for entry in &flag.forwards {
                    let target = match entry.split_once('/') {
                        Some((krate, feature)) => (CrateId::new(krate), feature.to_string()),
                        None => (id.clone(), entry.clone()),
                    };
                    feature_edges.entry(source.clone()).or_default().insert(target);
                }
            }
        }

        // All-pairs closure via one BFS per source. The search starts at the
        // source's successors, so a crate reaches itself only through an
        // actual cycle of at least one edge.
        let mut reachable = BTreeMap::new();
        for source in direct.keys() {
            let mut seen: BTreeSet<CrateId> = BTreeSet::new();
            let mut queue: VecDeque<&CrateId> = VecDeque::new();
            if let Some(targets) = direct.get(source) {
                for target in targets {
                    if seen.insert(target.clone()) {
                        queue.push_back(target);
                    }
                }
            }
            while let Some(next) = queue.pop_front() {
                if let Some(targets) = direct.get(next) {
                    for target in targets {
                        if seen.insert(target.clone()) {
                            queue.push_back(target);
                        }
                    }
                }
            }
            reachable.insert(source.clone(), seen);
        }

        Self {
            direct,
            reachable,
            feature_edges,
        }
    }

    /// True iff a direct edge `from -> to` exists.
    pub fn direct(&self, from: &CrateId, to: &CrateId) -> bool {
        self.direct.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// True iff `to` is reachable from `from` through one or more edges.
    /// `transitive(a, a)` holds only when `a` lies on a cycle.
    pub fn transitive(&self, from: &CrateId, to: &CrateId) -> bool {
        self.reachable
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// Feature-propagation query: `from` directly depends on `to`, has
    /// `feature` enabled while `to` defines it, and declares a forwarding
    /// entry `"to/feature"` under some feature. Without that entry the
    /// feature is not propagated, regardless of why `to`'s flag may be on.
    pub fn propagates(
        &self,
        universe: &Universe,
        from: &CrateId,
        to: &CrateId,
        feature: &str,
    ) -> bool {
        if !self.direct(from, to) {
            return false;
        }
        let (Some(from_info), Some(to_info)) = (universe.get(from), universe.get(to)) else {
            return false;
        };
        let enabled = from_info.features.get(feature).is_some_and(|f| f.enabled);
        let defines = to_info.features.get(feature).is_some_and(|f| f.defines);
        if !enabled || !defines {
            return false;
        }
        let needle = format!("{}/{}", to, feature);
        from_info
            .features
            .values()
            .any(|flag| flag.forwards.contains(&needle))
    }

    /// True iff feature `from_feature` of `from` activates feature
    /// `to_feature` of `to` through a single forwarding entry.
    pub fn enables(
        &self,
        from: &CrateId,
        from_feature: &str,
        to: &CrateId,
        to_feature: &str,
    ) -> bool {
        let source = (from.clone(), from_feature.to_string());
        let target = (to.clone(), to_feature.to_string());
        self.feature_edges
            .get(&source)
            .is_some_and(|targets| targets.contains(&target))
    }

    /// True iff the activation travels through one or more forwarding
    /// entries. A feature implies itself only through a forwarding cycle.
    pub fn implies(
        &self,
        from: &CrateId,
        from_feature: &str,
        to: &CrateId,
        to_feature: &str,
    ) -> bool {
        self.implies_path(from, from_feature, to, to_feature).is_some()
    }

    /// Shortest activation chain from `from/from_feature` to
    /// `to/to_feature`, rendered as `"crate/feature"` hops including both
    /// endpoints. `None` when no chain exists.
    pub fn implies_path(
        &self,
        from: &CrateId,
        from_feature: &str,
        to: &CrateId,
        to_feature: &str,
    ) -> Option<Vec<String>> {
        let source: FeatureNode = (from.clone(), from_feature.to_string());
        let target: FeatureNode = (to.clone(), to_feature.to_string());

        // BFS seeded with the source's successors, recording each node's
        // predecessor to rebuild the chain.
        let mut parent: BTreeMap<FeatureNode, FeatureNode> = BTreeMap::new();
        let mut queue: VecDeque<FeatureNode> = VecDeque::new();
        for next in self.feature_edges.get(&source).into_iter().flatten() {
            if !parent.contains_key(next) {
                parent.insert(next.clone(), source.clone());
                queue.push_back(next.clone());
            }
        }
        while let Some(node) = queue.pop_front() {
            if node == target {
                let mut hops = vec![format!("{}/{}", node.0, node.1)];
                let mut cursor = node;
                while let Some(prev) = parent.get(&cursor) {
                    hops.push(format!("{}/{}", prev.0, prev.1));
                    if *prev == source {
                        break;
                    }
                    cursor = prev.clone();
                }
                hops.reverse();
                return Some(hops);
            }
            for next in self.feature_edges.get(&node).into_iter().flatten() {
                if !parent.contains_key(next) {
                    parent.insert(next.clone(), node.clone());
                    queue.push_back(next.clone());
                }
            }
        }
        None
    }
}
