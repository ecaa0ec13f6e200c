use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationErrorKind, PatternCompileError, UnknownCrateReferenceError};
use crate::universe::{CrateId, Universe};

/// Crate-name pattern from a rule's `given` clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternSpec {
    Literal(String),
    Regex(String),
    Union(Vec<PatternSpec>),
}

/// A pattern with its regexes compiled, built once per rule and reused for
/// every candidate crate.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Literal(String),
    Regex(regex::Regex),
    Union(Vec<CompiledPattern>),
}

impl CompiledPattern {
    pub fn compile(spec: &PatternSpec) -> Result<Self, PatternCompileError> {
        match spec {
            PatternSpec::Literal(name) => Ok(CompiledPattern::Literal(name.clone())),
            PatternSpec::Regex(pattern) => match regex::Regex::new(pattern) {
                Ok(re) => Ok(CompiledPattern::Regex(re)),
                Err(err) => Err(PatternCompileError {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                }),
            },
            PatternSpec::Union(members) => {
                let compiled = members
                    .iter()
                    .map(CompiledPattern::compile)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledPattern::Union(compiled))
            }
        }
    }

    /// Resolve to the candidate set against the universe. Literals must
    /// name an existing crate; regexes select every matching crate name.
    pub fn resolve(&self, universe: &Universe) -> Result<BTreeSet<CrateId>, EvaluationErrorKind> {
        match self {
            CompiledPattern::Literal(name) => {
                let id = CrateId::new(name.clone());
                if !universe.contains(&id) {
                    return Err(UnknownCrateReferenceError { name: name.clone() }.into());
                }
                Ok(BTreeSet::from([id]))
            }
            CompiledPattern::Regex(re) => Ok(universe
                .crate_ids()
                .filter(|id| re.is_match(id.as_str()))
                .cloned()
                .collect()),
            CompiledPattern::Union(members) => {
                let mut out = BTreeSet::new();
                for member in members {
                    out.extend(member.resolve(universe)?);
                }
                Ok(out)
            }
        }
    }
}

/// Candidate set for one pattern variable. An unconstrained variable
/// ranges over the whole universe.
pub fn resolve_candidates(
    spec: Option<&PatternSpec>,
    universe: &Universe,
) -> Result<BTreeSet<CrateId>, EvaluationErrorKind> {
    match spec {
        None => Ok(universe.crate_ids().cloned().collect()),
        Some(spec) => {
            let compiled = CompiledPattern::compile(spec)?;
            compiled.resolve(universe)
        }
    }
}
