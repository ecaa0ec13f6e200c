use std::collections::BTreeMap;

use crate::error::{EvaluationError, EvaluationErrorKind};
use crate::fix;
use crate::graph::DepGraph;
use crate::pattern::resolve_candidates;
use crate::report::{rules_fingerprint, Report, RuleError, Violation};
use crate::rules::{DepRelation, FeatureRelation, FeatureTest, Predicate, Rule};
use crate::universe::{CrateId, Universe};

/// Knobs for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalOpts {
    /// Circuit breaker for binding enumeration, counted in candidate
    /// assignments per rule. A rule that exceeds it is abandoned with a
    /// `BudgetExceeded` error; other rules keep running.
    pub binding_budget: usize,
}

impl Default for EvalOpts {
    fn default() -> Self {
        Self {
            binding_budget: 1_000_000,
        }
    }
}

/// Evaluate every rule against the universe. The returned report's
/// violations are ordered by rule declaration, then lexicographically by
/// the bound crate names in variable declaration order.
pub fn evaluate(
    universe: &Universe,
    graph: &DepGraph,
    rules: &[Rule],
    opts: &EvalOpts,
) -> Report {
    let mut violations = Vec::new();
    let mut errors: Vec<RuleError> = Vec::new();

    for rule in rules {
        match eval_rule(universe, graph, rule, opts) {
            Ok((mut rule_violations, mut fix_errors)) => {
                violations.append(&mut rule_violations);
                errors.append(&mut fix_errors);
            }
            Err(kind) => {
                errors.push(RuleError::Evaluation(EvaluationError {
                    rule: rule.name.clone(),
                    kind,
                }));
            }
        }
    }

    Report {
        rules_fingerprint: rules_fingerprint(rules),
        violations,
        errors,
    }
}

/// Per-rule evaluation. A hard error discards the rule's partial output;
/// fix-template failures are soft and returned alongside the violations.
fn eval_rule(
    universe: &Universe,
    graph: &DepGraph,
    rule: &Rule,
    opts: &EvalOpts,
) -> Result<(Vec<Violation>, Vec<RuleError>), EvaluationErrorKind> {
    let vars = &rule.given.vars;
    let var_index: BTreeMap<&str, usize> = vars
        .iter()
        .enumerate()
        .map(|(i, v)| (v.name.as_str(), i))
        .collect();

    let index_of = |name: &str| -> Result<usize, EvaluationErrorKind> {
        var_index
            .get(name)
            .copied()
            .ok_or_else(|| EvaluationErrorKind::UnboundVariable {
                var: name.to_string(),
            })
    };

    // Every variable a predicate names must be declared, checked up
    // front so a bad rule fails before enumeration. Fix templates are
    // checked lazily at synthesis time and fail soft.
    for predicate in rule
        .given
        .preconditions
        .iter()
        .chain(std::iter::once(&rule.assertion.predicate))
    {
        for var in predicate.vars() {
            index_of(var)?;
        }
    }

    let candidates: Vec<Vec<CrateId>> = vars
        .iter()
        .map(|v| {
            resolve_candidates(v.pattern.as_ref(), universe)
                .map(|set| set.into_iter().collect())
        })
        .collect::<Result<_, _>>()?;

    // Each precondition is applied at the shallowest depth where all of
    // its variables are bound, pruning the product as early as possible.
    let mut filters_at: Vec<Vec<&Predicate>> = vec![Vec::new(); vars.len()];
    for predicate in &rule.given.preconditions {
        let depth = predicate
            .vars()
            .into_iter()
            .map(|v| index_of(v))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .max()
            .unwrap_or(0);
        filters_at[depth].push(predicate);
    }

    let mut cx = RuleCx {
        universe,
        graph,
        rule,
        var_index: &var_index,
        candidates: &candidates,
        filters_at: &filters_at,
        budget: opts.binding_budget,
        remaining: opts.binding_budget,
        violations: Vec::new(),
        fix_errors: Vec::new(),
    };

    if vars.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut bound: Vec<CrateId> = Vec::with_capacity(vars.len());
    cx.descend(&mut bound)?;

    Ok((cx.violations, cx.fix_errors))
}

struct RuleCx<'a> {
    universe: &'a Universe,
    graph: &'a DepGraph,
    rule: &'a Rule,
    var_index: &'a BTreeMap<&'a str, usize>,
    candidates: &'a [Vec<CrateId>],
    filters_at: &'a [Vec<&'a Predicate>],
    budget: usize,
    remaining: usize,
    violations: Vec<Violation>,
    fix_errors: Vec<RuleError>,
}

impl<'a> RuleCx<'a> {
    /// Depth-first enumeration over the candidate product in variable
    /// declaration order. Candidate vectors are sorted, so the visit
    /// order is already the required deterministic violation order.
    fn descend(&mut self, bound: &mut Vec<CrateId>) -> Result<(), EvaluationErrorKind> {
        let depth = bound.len();
        let candidates = self.candidates;
        let filters = self.filters_at;
        for candidate in &candidates[depth] {
            if self.remaining == 0 {
                return Err(EvaluationErrorKind::BudgetExceeded {
                    budget: self.budget,
                });
            }
            self.remaining -= 1;

            bound.push(candidate.clone());
            let keep = filters[depth].iter().all(|p| self.holds(p, bound));
            if keep {
                if depth + 1 == candidates.len() {
                    self.assert_binding(bound);
                } else {
                    self.descend(bound)?;
                }
            }
            bound.pop();
        }
        Ok(())
    }

    fn holds(&self, predicate: &Predicate, bound: &[CrateId]) -> bool {
        let id = |name: &str| &bound[self.var_index[name]];
        match predicate {
            Predicate::Dependency { from, relation, to } => match relation {
                DepRelation::Direct => self.graph.direct(id(from), id(to)),
                DepRelation::Transitive => self.graph.transitive(id(from), id(to)),
            },
            Predicate::Feature { var, test, feature } => {
                let Some(info) = self.universe.get(id(var)) else {
                    return false;
                };
                let flag = info.features.get(feature);
                match test {
                    FeatureTest::Enabled => flag.is_some_and(|f| f.enabled),
                    FeatureTest::Defines => flag.is_some_and(|f| f.defines),
                }
            }
            Predicate::Propagates { from, to, feature } => {
                self.graph.propagates(self.universe, id(from), id(to), feature)
            }
            Predicate::Implication {
                from,
                from_feature,
                relation,
                to,
                to_feature,
            } => match relation {
                FeatureRelation::Enables => {
                    self.graph.enables(id(from), from_feature, id(to), to_feature)
                }
                FeatureRelation::Implies => {
                    self.graph.implies(id(from), from_feature, id(to), to_feature)
                }
            },
        }
    }

    fn assert_binding(&mut self, bound: &[CrateId]) {
        let rule = self.rule;
        let mut outcome = self.holds(&rule.assertion.predicate, bound);
        if rule.assertion.negated {
            outcome = !outcome;
        }
        if outcome {
            return;
        }

        let binding: BTreeMap<String, CrateId> = rule
            .given
            .vars
            .iter()
            .zip(bound)
            .map(|(v, id)| (v.name.clone(), id.clone()))
            .collect();

        // A forbidden implication is witnessed by the activation chain
        // that produced it.
        let path = match &rule.assertion.predicate {
            Predicate::Implication {
                from,
                from_feature,
                relation: FeatureRelation::Implies,
                to,
                to_feature,
            } if rule.assertion.negated => self.graph.implies_path(
                &bound[self.var_index[from.as_str()]],
                from_feature,
                &bound[self.var_index[to.as_str()]],
                to_feature,
            ),
            _ => None,
        };

        let fix_action = match &rule.fix {
            None => None,
            Some(template) => match fix::synthesize(&rule.name, template, &binding) {
                Ok(action) => Some(action),
                Err(err) => {
                    // Binding-independent failure, so one entry per rule
                    // is enough; the violation still ships.
                    let err = RuleError::FixTemplate(err);
                    if !self.fix_errors.contains(&err) {
                        self.fix_errors.push(err);
                    }
                    None
                }
            },
        };

        self.violations.push(Violation {
            rule: rule.name.clone(),
            binding: binding.clone(),
            message: render_message(&rule.message, &binding),
            path,
            fix: fix_action,
        });
    }
}

/// Substitute `{Var}` placeholders with the bound crate names.
fn render_message(template: &str, binding: &BTreeMap<String, CrateId>) -> String {
    let mut out = template.to_string();
    for (var, id) in binding {
        out = out.replace(&format!("{{{}}}", var), id.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::FixAction;
    use crate::pattern::PatternSpec;
    use crate::rules::{Assertion, FixTemplate, Given, VarSpec};
    use crate::universe::DepKind;

    fn var(name: &str, pattern: Option<PatternSpec>) -> VarSpec {
        VarSpec {
            name: name.to_string(),
            pattern,
        }
    }

    fn re(pattern: &str) -> Option<PatternSpec> {
        Some(PatternSpec::Regex(pattern.to_string()))
    }

    fn run(universe: &Universe, rules: &[Rule]) -> Report {
        let graph = DepGraph::build(universe);
        evaluate(universe, &graph, rules, &EvalOpts::default())
    }

    fn propagation_rule() -> Rule {
        Rule {
            name: "propagate-runtime-benchmarks".to_string(),
            given: Given {
                vars: vec![var("A", None), var("B", None)],
                preconditions: vec![
                    Predicate::Dependency {
                        from: "A".to_string(),
                        relation: DepRelation::Direct,
                        to: "B".to_string(),
                    },
                    Predicate::Feature {
                        var: "A".to_string(),
                        test: FeatureTest::Enabled,
                        feature: "runtime-benchmarks".to_string(),
                    },
                    Predicate::Feature {
                        var: "B".to_string(),
                        test: FeatureTest::Defines,
                        feature: "runtime-benchmarks".to_string(),
                    },
                ],
            },
            assertion: Assertion {
                negated: false,
                predicate: Predicate::Propagates {
                    from: "A".to_string(),
                    to: "B".to_string(),
                    feature: "runtime-benchmarks".to_string(),
                },
            },
            message: "feature `runtime-benchmarks` is not propagates".to_string(),
            fix: Some(FixTemplate::EnableFeatureForward {
                var: "A".to_string(),
                feature: "runtime-benchmarks".to_string(),
                target: "B".to_string(),
            }),
        }
    }

    fn forbidden_dep_rule(name: &str, relation: DepRelation) -> Rule {
        Rule {
            name: name.to_string(),
            given: Given {
                vars: vec![var("A", re("^sp-.*")), var("B", re("^frame-.*"))],
                preconditions: vec![],
            },
            assertion: Assertion {
                negated: true,
                predicate: Predicate::Dependency {
                    from: "A".to_string(),
                    relation,
                    to: "B".to_string(),
                },
            },
            message: "crate {A} must not depend on {B}".to_string(),
            fix: Some(FixTemplate::RemoveDependency {
                from: "A".to_string(),
                to: "B".to_string(),
            }),
        }
    }

    #[test]
    fn missing_feature_forward_is_reported_with_fix() {
        let mut universe = Universe::new();
        universe.add_crate("node-a");
        universe.add_crate("node-b");
        universe.add_dependency("node-a", "node-b", DepKind::Normal);
        universe.set_feature("node-a", "runtime-benchmarks", false, true);
        universe.set_feature("node-b", "runtime-benchmarks", true, false);

        let rules = vec![propagation_rule()];
        let report = run(&universe, &rules);

        assert!(report.errors.is_empty());
        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.message, "feature `runtime-benchmarks` is not propagates");
        assert_eq!(
            violation.fix,
            Some(FixAction::EnableFeatureForward {
                krate: CrateId::new("node-a"),
                feature: "runtime-benchmarks".to_string(),
                target: "node-b/runtime-benchmarks".to_string(),
            })
        );

        // Applying the suggested forward clears the violation.
        universe.add_forward("node-a", "runtime-benchmarks", "node-b/runtime-benchmarks");
        let report = run(&universe, &rules);
        assert!(report.passed());
    }

    #[test]
    fn forbidden_feature_implication_reports_the_chain() {
        let mut universe = Universe::new();
        for name in ["node-a", "node-b", "node-c"] {
            universe.add_crate(name);
        }
        universe.set_feature("node-a", "no-std", true, false);
        universe.set_feature("node-b", "lite", true, false);
        universe.set_feature("node-c", "std", true, false);
        universe.add_forward("node-a", "no-std", "node-b/lite");
        universe.add_forward("node-b", "lite", "node-c/std");

        let rule = Rule {
            name: "no-std-never-implies-std".to_string(),
            given: Given {
                vars: vec![var("A", None), var("B", None)],
                preconditions: vec![],
            },
            assertion: Assertion {
                negated: true,
                predicate: Predicate::Implication {
                    from: "A".to_string(),
                    from_feature: "no-std".to_string(),
                    relation: FeatureRelation::Implies,
                    to: "B".to_string(),
                    to_feature: "std".to_string(),
                },
            },
            message: "`no-std` of {A} must not imply `std` of {B}".to_string(),
            fix: None,
        };
        let report = run(&universe, &[rule]);

        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.binding["A"], CrateId::new("node-a"));
        assert_eq!(violation.binding["B"], CrateId::new("node-c"));
        assert_eq!(
            violation.path,
            Some(vec![
                "node-a/no-std".to_string(),
                "node-b/lite".to_string(),
                "node-c/std".to_string(),
            ])
        );
        assert_eq!(
            violation.message,
            "`no-std` of node-a must not imply `std` of node-c"
        );
    }

    #[test]
    fn forbidden_direct_enablement_carries_no_chain() {
        let mut universe = Universe::new();
        universe.add_crate("node-a");
        universe.add_crate("node-b");
        universe.set_feature("node-a", "default", true, false);
        universe.set_feature("node-b", "std", true, false);
        universe.add_forward("node-a", "default", "node-b/std");

        let rule = Rule {
            name: "default-never-enables-std".to_string(),
            given: Given {
                vars: vec![var("A", None), var("B", None)],
                preconditions: vec![],
            },
            assertion: Assertion {
                negated: true,
                predicate: Predicate::Implication {
                    from: "A".to_string(),
                    from_feature: "default".to_string(),
                    relation: FeatureRelation::Enables,
                    to: "B".to_string(),
                    to_feature: "std".to_string(),
                },
            },
            message: "`default` of {A} must not enable `std` of {B}".to_string(),
            fix: None,
        };
        let report = run(&universe, &[rule]);

        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.binding["A"], CrateId::new("node-a"));
        assert_eq!(violation.binding["B"], CrateId::new("node-b"));
        assert_eq!(violation.path, None);
    }

    #[test]
    fn direct_forbidden_dependency() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");
        universe.add_crate("frame-system");
        universe.add_dependency("sp-core", "frame-system", DepKind::Normal);

        let rules = vec![forbidden_dep_rule("no-frame-deps", DepRelation::Direct)];
        let report = run(&universe, &rules);

        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.binding["A"], CrateId::new("sp-core"));
        assert_eq!(violation.binding["B"], CrateId::new("frame-system"));
        assert_eq!(violation.message, "crate sp-core must not depend on frame-system");
        assert_eq!(
            violation.fix,
            Some(FixAction::RemoveDependency {
                from: CrateId::new("sp-core"),
                to: CrateId::new("frame-system"),
            })
        );
    }

    #[test]
    fn transitive_forbidden_dependency_through_intermediary() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");
        universe.add_crate("sp-io");
        universe.add_crate("frame-system");
        universe.add_dependency("sp-core", "sp-io", DepKind::Normal);
        universe.add_dependency("sp-io", "frame-system", DepKind::Normal);

        let direct = vec![forbidden_dep_rule("no-direct", DepRelation::Direct)];
        assert!(run(&universe, &direct).passed());

        let transitive = vec![forbidden_dep_rule("no-transitive", DepRelation::Transitive)];
        let report = run(&universe, &transitive);
        // Both sp-core and sp-io reach frame-system.
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].binding["A"], CrateId::new("sp-core"));
        assert_eq!(report.violations[1].binding["A"], CrateId::new("sp-io"));
    }

    #[test]
    fn empty_candidate_set_is_vacuously_true() {
        let mut universe = Universe::new();
        universe.add_crate("alpha");
        let rules = vec![forbidden_dep_rule("no-frame-deps", DepRelation::Direct)];
        let report = run(&universe, &rules);
        assert!(report.passed());
    }

    #[test]
    fn negation_yields_one_violation_per_offending_binding() {
        let mut universe = Universe::new();
        for name in ["sp-core", "sp-io", "frame-system", "frame-support"] {
            universe.add_crate(name);
        }
        universe.add_dependency("sp-core", "frame-system", DepKind::Normal);
        universe.add_dependency("sp-core", "frame-support", DepKind::Normal);
        universe.add_dependency("sp-io", "frame-system", DepKind::Normal);

        let rules = vec![forbidden_dep_rule("no-frame-deps", DepRelation::Direct)];
        let report = run(&universe, &rules);
        assert_eq!(report.violations.len(), 3);
        let pairs: Vec<(&str, &str)> = report
            .violations
            .iter()
            .map(|v| (v.binding["A"].as_str(), v.binding["B"].as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("sp-core", "frame-support"),
                ("sp-core", "frame-system"),
                ("sp-io", "frame-system"),
            ]
        );
    }

    #[test]
    fn reports_are_byte_identical_across_runs() {
        let mut universe = Universe::new();
        for name in ["sp-core", "sp-io", "frame-system"] {
            universe.add_crate(name);
        }
        universe.add_dependency("sp-core", "frame-system", DepKind::Normal);
        universe.add_dependency("sp-io", "frame-system", DepKind::Normal);

        let rules = vec![
            forbidden_dep_rule("no-direct", DepRelation::Direct),
            forbidden_dep_rule("no-transitive", DepRelation::Transitive),
        ];
        let first = serde_json::to_string(&run(&universe, &rules)).unwrap();
        let second = serde_json::to_string(&run(&universe, &rules)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn budget_exceeded_abandons_only_that_rule() {
        let mut universe = Universe::new();
        for name in ["sp-a", "sp-b", "sp-c", "frame-x"] {
            universe.add_crate(name);
        }
        universe.add_dependency("sp-a", "frame-x", DepKind::Normal);

        let rules = vec![
            forbidden_dep_rule("tight", DepRelation::Direct),
            forbidden_dep_rule("also-runs", DepRelation::Direct),
        ];
        let graph = DepGraph::build(&universe);
        let opts = EvalOpts { binding_budget: 2 };
        let report = evaluate(&universe, &graph, &rules, &opts);

        // The first rule trips the breaker and contributes no violations;
        // the second still runs under its own budget.
        assert_eq!(report.errors.len(), 2);
        for error in &report.errors {
            assert!(matches!(
                error,
                RuleError::Evaluation(EvaluationError {
                    kind: EvaluationErrorKind::BudgetExceeded { .. },
                    ..
                })
            ));
        }
    }

    #[test]
    fn bad_pattern_is_rule_scoped() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");
        universe.add_crate("frame-system");
        universe.add_dependency("sp-core", "frame-system", DepKind::Normal);

        let mut broken = forbidden_dep_rule("broken", DepRelation::Direct);
        broken.given.vars[0].pattern = Some(PatternSpec::Regex("^(sp-".to_string()));
        let rules = vec![broken, forbidden_dep_rule("intact", DepRelation::Direct)];
        let report = run(&universe, &rules);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].rule(), "broken");
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule, "intact");
    }

    #[test]
    fn undeclared_variable_in_assertion_is_an_error() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");

        let mut rule = forbidden_dep_rule("dangling", DepRelation::Direct);
        rule.assertion.predicate = Predicate::Dependency {
            from: "A".to_string(),
            relation: DepRelation::Direct,
            to: "C".to_string(),
        };
        let report = run(&universe, &[rule]);
        assert!(matches!(
            report.errors[0],
            RuleError::Evaluation(EvaluationError {
                kind: EvaluationErrorKind::UnboundVariable { ref var },
                ..
            }) if var == "C"
        ));
    }

    #[test]
    fn fix_template_failure_still_reports_violation() {
        let mut universe = Universe::new();
        universe.add_crate("sp-core");
        universe.add_crate("frame-system");
        universe.add_dependency("sp-core", "frame-system", DepKind::Normal);

        let mut rule = forbidden_dep_rule("bad-fix", DepRelation::Direct);
        rule.fix = Some(FixTemplate::RemoveDependency {
            from: "A".to_string(),
            to: "Z".to_string(),
        });
        let report = run(&universe, &[rule]);

        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].fix.is_none());
        assert!(matches!(
            report.errors[0],
            RuleError::FixTemplate(ref err) if err.placeholder == "Z"
        ));
    }
}
