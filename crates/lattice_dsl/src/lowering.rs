use std::collections::HashSet;

use crate::ast::*;
use crate::span::Span;

/// Lower the parsed rule file into the engine's typed rules, checking
/// name-level validity: duplicate rule names, duplicate variables, and
/// references to undeclared variables in constraints, the assertion, and
/// the auto-fix directive.
pub fn lower_rules(file: RuleFile) -> Result<Vec<lattice_core::Rule>, Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let mut seen_rules: HashSet<String> = HashSet::new();
    let mut rules = Vec::new();

    for def in file.rules {
        if !seen_rules.insert(def.name.clone()) {
            errors.push(located(
                &def.span,
                format!("duplicate rule name: {}", def.name),
            ));
            continue;
        }
        rules.push(lower_rule(def, &mut errors));
    }

    if errors.is_empty() {
        Ok(rules)
    } else {
        Err(errors)
    }
}

/// Diagnostics lead with `file:line:col`, matching `ParseError` rendering.
fn located(span: &Span, message: String) -> String {
    format!("{}:{}:{}: {}", span.file, span.line, span.col, message)
}

fn lower_rule(def: RuleDef, errors: &mut Vec<String>) -> lattice_core::Rule {
    let RuleDef {
        name,
        given,
        assertion,
        message,
        fix,
        span: _,
    } = def;

    let mut declared: HashSet<String> = HashSet::new();
    let mut vars = Vec::new();
    for decl in given.crates {
        if !declared.insert(decl.var.clone()) {
            errors.push(located(
                &decl.span,
                format!("rule `{}`: duplicate variable `{}`", name, decl.var),
            ));
            continue;
        }
        vars.push(lattice_core::VarSpec {
            name: decl.var,
            pattern: decl.pattern.map(lower_pattern),
        });
    }

    let mut check_var = |var: &str, place: &str, span: &Span| {
        if !declared.contains(var) {
            errors.push(located(
                span,
                format!("rule `{}`: unknown variable `{}` in {}", name, var, place),
            ));
        }
    };

    let mut preconditions = Vec::new();
    for dep in given.dependencies {
        check_var(&dep.from, "dependencies", &dep.span);
        check_var(&dep.to, "dependencies", &dep.span);
        preconditions.push(lattice_core::Predicate::Dependency {
            from: dep.from,
            relation: lower_relation(dep.relation),
            to: dep.to,
        });
    }
    for feature in given.features {
        check_var(&feature.var, "features", &feature.span);
        preconditions.push(lattice_core::Predicate::Feature {
            var: feature.var,
            test: lower_feature_test(feature.test),
            feature: feature.feature,
        });
    }

    let AssertionExpr {
        negated,
        predicate,
        span: assertion_span,
    } = assertion;
    let predicate = match predicate {
        PredicateExpr::Dependency { from, relation, to } => {
            check_var(&from, "then", &assertion_span);
            check_var(&to, "then", &assertion_span);
            lattice_core::Predicate::Dependency {
                from,
                relation: lower_relation(relation),
                to,
            }
        }
        PredicateExpr::Feature { var, test, feature } => {
            check_var(&var, "then", &assertion_span);
            lattice_core::Predicate::Feature {
                var,
                test: lower_feature_test(test),
                feature,
            }
        }
        PredicateExpr::Propagates { from, to, feature } => {
            check_var(&from, "then", &assertion_span);
            check_var(&to, "then", &assertion_span);
            lattice_core::Predicate::Propagates { from, to, feature }
        }
        PredicateExpr::Implication {
            from,
            from_feature,
            relation,
            to,
            to_feature,
        } => {
            check_var(&from, "then", &assertion_span);
            check_var(&to, "then", &assertion_span);
            lattice_core::Predicate::Implication {
                from,
                from_feature,
                relation: lower_implication(relation),
                to,
                to_feature,
            }
        }
    };

    let fix = fix.map(|directive| match directive {
        FixDirective::EnableFeature {
            var,
            feature,
            target,
            span,
        } => {
            check_var(&var, "auto-fix", &span);
            check_var(&target, "auto-fix", &span);
            lattice_core::FixTemplate::EnableFeatureForward {
                var,
                feature,
                target,
            }
        }
        FixDirective::RemoveDependency { from, to, span } => {
            check_var(&from, "auto-fix", &span);
            check_var(&to, "auto-fix", &span);
            lattice_core::FixTemplate::RemoveDependency { from, to }
        }
        FixDirective::AddDependency {
            from,
            to,
            feature,
            span,
        } => {
            check_var(&from, "auto-fix", &span);
            check_var(&to, "auto-fix", &span);
            lattice_core::FixTemplate::AddDependency { from, to, feature }
        }
    });

    lattice_core::Rule {
        name,
        given: lattice_core::Given {
            vars,
            preconditions,
        },
        assertion: lattice_core::Assertion { negated, predicate },
        message,
        fix,
    }
}

fn lower_pattern(expr: PatternExpr) -> lattice_core::PatternSpec {
    match expr {
        PatternExpr::Name(name) => lattice_core::PatternSpec::Literal(name),
        PatternExpr::Regex(pattern) => lattice_core::PatternSpec::Regex(pattern),
        PatternExpr::Union(members) => {
            lattice_core::PatternSpec::Union(members.into_iter().map(lower_pattern).collect())
        }
    }
}

fn lower_relation(relation: RelationKind) -> lattice_core::DepRelation {
    match relation {
        RelationKind::Direct => lattice_core::DepRelation::Direct,
        RelationKind::Transitive => lattice_core::DepRelation::Transitive,
    }
}

fn lower_feature_test(test: FeatureTestKind) -> lattice_core::FeatureTest {
    match test {
        FeatureTestKind::Enabled => lattice_core::FeatureTest::Enabled,
        FeatureTestKind::Defines => lattice_core::FeatureTest::Defines,
    }
}

fn lower_implication(kind: ImplicationKind) -> lattice_core::FeatureRelation {
    match kind {
        ImplicationKind::Enables => lattice_core::FeatureRelation::Enables,
        ImplicationKind::Implies => lattice_core::FeatureRelation::Implies,
    }
}
