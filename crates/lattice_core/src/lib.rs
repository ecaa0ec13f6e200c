//! Core rule-evaluation engine: crate universe model, dependency graph
//! queries, pattern resolution, binding enumeration and auto-fix synthesis.

pub mod error;
pub mod eval;
pub mod fix;
pub mod graph;
pub mod pattern;
pub mod report;
pub mod rules;
pub mod universe;

pub use error::{
    EvaluationError, EvaluationErrorKind, FixTemplateError, PatternCompileError,
    UnknownCrateReferenceError,
};
pub use eval::{evaluate, EvalOpts};
pub use fix::FixAction;
pub use graph::DepGraph;
pub use pattern::{CompiledPattern, PatternSpec};
pub use report::{Report, RuleError, Violation};
pub use rules::{
    Assertion, DepRelation, FeatureRelation, FeatureTest, FixTemplate, Given, Predicate, Rule,
    VarSpec,
};
pub use universe::{CrateId, CrateInfo, DepEntry, DepKind, FeatureFlag, Universe};
