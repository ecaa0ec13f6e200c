use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EvaluationError, FixTemplateError};
use crate::fix::FixAction;
use crate::rules::Rule;
use crate::universe::CrateId;

/// One failed assertion, pinned to the binding that falsified it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub rule: String,
    pub binding: BTreeMap<String, CrateId>,
    pub message: String,
    /// Activation chain witnessing a forbidden feature implication, as
    /// `"crate/feature"` hops. Only set for negated `implies` assertions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixAction>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// A rule-scoped failure surfaced in the report instead of aborting the
/// run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleError {
    Evaluation(EvaluationError),
    FixTemplate(FixTemplateError),
}

impl RuleError {
    pub fn rule(&self) -> &str {
        match self {
            RuleError::Evaluation(err) => &err.rule,
            RuleError::FixTemplate(err) => &err.rule,
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::Evaluation(err) => write!(f, "{}", err),
            RuleError::FixTemplate(err) => write!(f, "{}", err),
        }
    }
}

impl From<EvaluationError> for RuleError {
    fn from(err: EvaluationError) -> Self {
        RuleError::Evaluation(err)
    }
}

impl From<FixTemplateError> for RuleError {
    fn from(err: FixTemplateError) -> Self {
        RuleError::FixTemplate(err)
    }
}

/// The outcome of one evaluation run. Violations are ordered by rule
/// declaration, then lexicographically by bound crate names, so two runs
/// over the same inputs serialize byte-identically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    /// Canonical fingerprint of the rule set that produced this report.
    pub rules_fingerprint: String,
    pub violations: Vec<Violation>,
    pub errors: Vec<RuleError>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty()
    }
}

/// SHA-256 over the canonical JSON serialization of the rule set.
pub fn rules_fingerprint(rules: &[Rule]) -> String {
    let json = serde_json::to_string(rules).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
