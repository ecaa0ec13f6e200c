use serde::{Deserialize, Serialize};

use crate::pattern::PatternSpec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepRelation {
    Direct,
    Transitive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureTest {
    Enabled,
    Defines,
}

/// How a feature activation travels along forwarding entries: `Enables`
/// is a single hop, `Implies` is its transitive closure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureRelation {
    Enables,
    Implies,
}

/// The predicate vocabulary shared by preconditions and assertions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Dependency {
        from: String,
        relation: DepRelation,
        to: String,
    },
    Feature {
        var: String,
        test: FeatureTest,
        feature: String,
    },
    Propagates {
        from: String,
        to: String,
        feature: String,
    },
    Implication {
        from: String,
        from_feature: String,
        relation: FeatureRelation,
        to: String,
        to_feature: String,
    },
}

impl Predicate {
    /// Variables this predicate refers to, in syntactic order.
    pub fn vars(&self) -> Vec<&str> {
        match self {
            Predicate::Dependency { from, to, .. } => vec![from, to],
            Predicate::Feature { var, .. } => vec![var],
            Predicate::Propagates { from, to, .. } => vec![from, to],
            Predicate::Implication { from, to, .. } => vec![from, to],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assertion {
    #[serde(default)]
    pub negated: bool,
    pub predicate: Predicate,
}

/// One pattern variable declaration. `None` means unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VarSpec {
    pub name: String,
    pub pattern: Option<PatternSpec>,
}

/// The `given` clause: pattern variables in declaration order plus the
/// structural preconditions that filter the candidate product. The
/// preconditions are join filters, never asserted on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Given {
    pub vars: Vec<VarSpec>,
    #[serde(default)]
    pub preconditions: Vec<Predicate>,
}

/// Auto-fix template, instantiated per violating binding. Variable slots
/// name `given` variables; feature slots are literal feature names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixTemplate {
    EnableFeatureForward {
        var: String,
        feature: String,
        target: String,
    },
    RemoveDependency {
        from: String,
        to: String,
    },
    AddDependency {
        from: String,
        to: String,
        feature: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub given: Given,
    pub assertion: Assertion,
    /// Message template; `{Var}` placeholders are substituted with bound
    /// crate names when a violation is rendered.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixTemplate>,
}
