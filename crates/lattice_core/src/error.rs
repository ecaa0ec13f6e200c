use std::fmt;

use serde::{Deserialize, Serialize};

/// A crate-name pattern failed to compile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternCompileError {
    pub pattern: String,
    pub message: String,
}

impl fmt::Display for PatternCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pattern `{}`: {}", self.pattern, self.message)
    }
}

impl std::error::Error for PatternCompileError {}

/// A literal crate name that does not exist in the universe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnknownCrateReferenceError {
    pub name: String,
}

impl fmt::Display for UnknownCrateReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown crate reference `{}`", self.name)
    }
}

impl std::error::Error for UnknownCrateReferenceError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationErrorKind {
    PatternCompile(PatternCompileError),
    UnknownCrateReference(UnknownCrateReferenceError),
    UnboundVariable { var: String },
    BudgetExceeded { budget: usize },
}

/// A rule-scoped evaluation failure. Other rules keep running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationError {
    pub rule: String,
    pub kind: EvaluationErrorKind,
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule `{}`: ", self.rule)?;
        match &self.kind {
            EvaluationErrorKind::PatternCompile(err) => write!(f, "{}", err),
            EvaluationErrorKind::UnknownCrateReference(err) => write!(f, "{}", err),
            EvaluationErrorKind::UnboundVariable { var } => {
                write!(f, "reference to undeclared variable `{}`", var)
            }
            EvaluationErrorKind::BudgetExceeded { budget } => {
                write!(f, "binding enumeration exceeded budget of {} tuples", budget)
            }
        }
    }
}

impl std::error::Error for EvaluationError {}

impl From<PatternCompileError> for EvaluationErrorKind {
    fn from(err: PatternCompileError) -> Self {
        EvaluationErrorKind::PatternCompile(err)
    }
}

impl From<UnknownCrateReferenceError> for EvaluationErrorKind {
    fn from(err: UnknownCrateReferenceError) -> Self {
        EvaluationErrorKind::UnknownCrateReference(err)
    }
}

/// An auto-fix template referenced a placeholder with no binding.
/// The violation is still reported, without a fix attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixTemplateError {
    pub rule: String,
    pub placeholder: String,
}

impl fmt::Display for FixTemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule `{}`: auto-fix template references unbound placeholder `{}`",
            self.rule, self.placeholder
        )
    }
}

impl std::error::Error for FixTemplateError {}
