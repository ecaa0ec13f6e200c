use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FixTemplateError;
use crate::rules::FixTemplate;
use crate::universe::CrateId;

/// A synthesized remediation suggestion. Inert data: the engine never
/// applies it; mutating real manifests is the caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FixAction {
    EnableFeatureForward {
        krate: CrateId,
        feature: String,
        /// `"crate/feature"` forwarding entry to add.
        target: String,
    },
    RemoveDependency {
        from: CrateId,
        to: CrateId,
    },
    AddDependency {
        from: CrateId,
        to: CrateId,
        feature: Option<String>,
    },
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixAction::EnableFeatureForward {
                krate,
                feature,
                target,
            } => write!(
                f,
                "enable-feature-forward crate={} feature={} target={}",
                krate, feature, target
            ),
            FixAction::RemoveDependency { from, to } => {
                write!(f, "remove-dependency from={} to={}", from, to)
            }
            FixAction::AddDependency { from, to, feature } => {
                write!(f, "add-dependency from={} to={}", from, to)?;
                if let Some(feature) = feature {
                    write!(f, " feature={}", feature)?;
                }
                Ok(())
            }
        }
    }
}

/// Substitute a violating binding into a rule's fix template.
pub fn synthesize(
    rule: &str,
    template: &FixTemplate,
    binding: &BTreeMap<String, CrateId>,
) -> Result<FixAction, FixTemplateError> {
    let lookup = |var: &str| -> Result<CrateId, FixTemplateError> {
        binding.get(var).cloned().ok_or_else(|| FixTemplateError {
            rule: rule.to_string(),
            placeholder: var.to_string(),
        })
    };

    match template {
        FixTemplate::EnableFeatureForward {
            var,
            feature,
            target,
        } => {
            let krate = lookup(var)?;
            let target_crate = lookup(target)?;
            Ok(FixAction::EnableFeatureForward {
                krate,
                feature: feature.clone(),
                target: format!("{}/{}", target_crate, feature),
            })
        }
        FixTemplate::RemoveDependency { from, to } => Ok(FixAction::RemoveDependency {
            from: lookup(from)?,
            to: lookup(to)?,
        }),
        FixTemplate::AddDependency { from, to, feature } => Ok(FixAction::AddDependency {
            from: lookup(from)?,
            to: lookup(to)?,
            feature: feature.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding() -> BTreeMap<String, CrateId> {
        BTreeMap::from([
            ("A".to_string(), CrateId::new("sp-core")),
            ("B".to_string(), CrateId::new("frame-system")),
        ])
    }

    #[test]
    fn enable_feature_forward_renders_target() {
        let template = FixTemplate::EnableFeatureForward {
            var: "A".to_string(),
            feature: "runtime-benchmarks".to_string(),
            target: "B".to_string(),
        };
        let action = synthesize("propagate", &template, &binding()).unwrap();
        assert_eq!(
            action,
            FixAction::EnableFeatureForward {
                krate: CrateId::new("sp-core"),
                feature: "runtime-benchmarks".to_string(),
                target: "frame-system/runtime-benchmarks".to_string(),
            }
        );
    }

    #[test]
    fn unbound_placeholder_fails_synthesis() {
        let template = FixTemplate::RemoveDependency {
            from: "A".to_string(),
            to: "C".to_string(),
        };
        let err = synthesize("forbidden", &template, &binding()).unwrap_err();
        assert_eq!(err.placeholder, "C");
        assert_eq!(err.rule, "forbidden");
    }
}
