use serde::{Deserialize, Serialize};

use crate::span::Span;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleFile {
    pub rules: Vec<RuleDef>,
}

/// One `test:` block, exactly as written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleDef {
    pub name: String,
    pub given: GivenBlock,
    pub assertion: AssertionExpr,
    pub message: String,
    pub fix: Option<FixDirective>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GivenBlock {
    pub crates: Vec<CrateVarDecl>,
    pub dependencies: Vec<DepConstraint>,
    pub features: Vec<FeatureConstraint>,
}

/// `A: regex("^sp-.*") | frame-support`. A bare `A:` is unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrateVarDecl {
    pub var: String,
    pub pattern: Option<PatternExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PatternExpr {
    Name(String),
    Regex(String),
    Union(Vec<PatternExpr>),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelationKind {
    Direct,
    Transitive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepConstraint {
    pub from: String,
    pub relation: RelationKind,
    pub to: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeatureTestKind {
    Enabled,
    Defines,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImplicationKind {
    Enables,
    Implies,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureConstraint {
    pub var: String,
    pub test: FeatureTestKind,
    pub feature: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PredicateExpr {
    Dependency {
        from: String,
        relation: RelationKind,
        to: String,
    },
    Feature {
        var: String,
        test: FeatureTestKind,
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
        relation: ImplicationKind,
        to: String,
        to_feature: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssertionExpr {
    pub negated: bool,
    pub predicate: PredicateExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FixDirective {
    EnableFeature {
        var: String,
        feature: String,
        target: String,
        span: Span,
    },
    RemoveDependency {
        from: String,
        to: String,
        span: Span,
    },
    AddDependency {
        from: String,
        to: String,
        feature: Option<String>,
        span: Span,
    },
}
