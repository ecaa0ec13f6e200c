use chumsky::prelude::*;
use chumsky::Stream;

use crate::ast::*;
use crate::errors::{to_parse_error, ParseError};
use crate::lexer::lex;
use crate::span::{make_span, LineIndex};
use crate::tokens::Token;

#[derive(Debug, Clone)]
enum FeatureTail {
    Test {
        test: FeatureTestKind,
        feature: String,
    },
    Propagates {
        to: String,
        feature: String,
    },
    Implication {
        relation: ImplicationKind,
        from_feature: String,
        to: String,
        to_feature: String,
    },
}

pub fn parse_rules(source: &str, file: &str) -> Result<RuleFile, Vec<ParseError>> {
    let line_index = LineIndex::new(source);
    let tokens = lex(source, file, &line_index)?;
    let span_end = source.len()..source.len() + 1;
    let stream = Stream::from_iter(span_end, tokens.into_iter());

    let ident = select! { Token::Ident(s) => s };
    let string = select! { Token::Str(s) => s };

    let relation = choice::<_, Simple<Token>>((
        just(Token::KwDirect).to(RelationKind::Direct),
        just(Token::KwTransitive).to(RelationKind::Transitive),
    ));
    let feature_test = choice::<_, Simple<Token>>((
        just(Token::KwEnabled).to(FeatureTestKind::Enabled),
        just(Token::KwDefines).to(FeatureTestKind::Defines),
    ));

    let pattern_atom = choice::<_, Simple<Token>>((
        just(Token::KwRegex)
            .ignore_then(
                string
                    .clone()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(PatternExpr::Regex),
        ident.clone().map(PatternExpr::Name),
    ));
    let pattern = pattern_atom
        .separated_by(just(Token::Pipe))
        .at_least(1)
        .map(|mut items| {
            if items.len() == 1 {
                items.remove(0)
            } else {
                PatternExpr::Union(items)
            }
        });

    let crate_var = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .then(pattern.clone().or_not())
        .then_ignore(just(Token::Newline))
        .map_with_span(|(var, pattern), span| CrateVarDecl {
            var,
            pattern,
            span: make_span(file, span, &line_index),
        });
    let crates_section = just(Token::KwCrates)
        .ignore_then(just(Token::Colon))
        .ignore_then(just(Token::Newline))
        .ignore_then(
            crate_var
                .repeated()
                .at_least(1)
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        );

    let dep_constraint = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .then(relation.clone())
        .then_ignore(just(Token::Colon))
        .then(ident.clone())
        .then_ignore(just(Token::Newline))
        .map_with_span(|((from, relation), to), span| DepConstraint {
            from,
            relation,
            to,
            span: make_span(file, span, &line_index),
        });
    let dependencies_section = just(Token::KwDependencies)
        .ignore_then(just(Token::Colon))
        .ignore_then(just(Token::Newline))
        .ignore_then(
            dep_constraint
                .repeated()
                .at_least(1)
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        );

    let feature_constraint = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .then(feature_test.clone())
        .then_ignore(just(Token::Colon))
        .then(ident.clone())
        .then_ignore(just(Token::Newline))
        .map_with_span(|((var, test), feature), span| FeatureConstraint {
            var,
            test,
            feature,
            span: make_span(file, span, &line_index),
        });
    let features_section = just(Token::KwFeatures)
        .ignore_then(just(Token::Colon))
        .ignore_then(just(Token::Newline))
        .ignore_then(
            feature_constraint
                .repeated()
                .at_least(1)
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        );

    let given_block = just(Token::KwGiven)
        .ignore_then(just(Token::Colon))
        .ignore_then(just(Token::Newline))
        .ignore_then(
            crates_section
                .then(dependencies_section.or_not())
                .then(features_section.or_not())
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        )
        .map(|((crates, dependencies), features)| GivenBlock {
            crates,
            dependencies: dependencies.unwrap_or_default(),
            features: features.unwrap_or_default(),
        });

    let dep_predicate = just(Token::KwDependencies)
        .ignore_then(just(Token::Colon))
        .ignore_then(ident.clone())
        .then_ignore(just(Token::Colon))
        .then(relation.clone())
        .then_ignore(just(Token::Colon))
        .then(ident.clone())
        .map(|((from, relation), to)| PredicateExpr::Dependency { from, relation, to });
    let feature_predicate = just(Token::KwFeatures)
        .ignore_then(just(Token::Colon))
        .ignore_then(ident.clone())
        .then_ignore(just(Token::Colon))
        .then(choice::<_, Simple<Token>>((
            just(Token::KwPropagates)
                .ignore_then(just(Token::Colon))
                .ignore_then(ident.clone())
                .then_ignore(just(Token::Colon))
                .then(ident.clone())
                .map(|(to, feature)| FeatureTail::Propagates { to, feature }),
            choice::<_, Simple<Token>>((
                just(Token::KwEnables).to(ImplicationKind::Enables),
                just(Token::KwImplies).to(ImplicationKind::Implies),
            ))
            .then_ignore(just(Token::Colon))
            .then(ident.clone())
            .then_ignore(just(Token::Colon))
            .then(ident.clone())
            .then_ignore(just(Token::Colon))
            .then(ident.clone())
            .map(
                |(((relation, from_feature), to), to_feature)| FeatureTail::Implication {
                    relation,
                    from_feature,
                    to,
                    to_feature,
                },
            ),
            feature_test
                .clone()
                .then_ignore(just(Token::Colon))
                .then(ident.clone())
                .map(|(test, feature)| FeatureTail::Test { test, feature }),
        )))
        .map(|(var, tail)| match tail {
            FeatureTail::Test { test, feature } => PredicateExpr::Feature { var, test, feature },
            FeatureTail::Propagates { to, feature } => PredicateExpr::Propagates {
                from: var,
                to,
                feature,
            },
            FeatureTail::Implication {
                relation,
                from_feature,
                to,
                to_feature,
            } => PredicateExpr::Implication {
                from: var,
                from_feature,
                relation,
                to,
                to_feature,
            },
        });
    let predicate = choice::<_, Simple<Token>>((dep_predicate, feature_predicate));

    let then_block = just(Token::KwThen)
        .ignore_then(just(Token::Colon))
        .ignore_then(just(Token::Newline))
        .ignore_then(
            just(Token::KwNot)
                .ignore_then(just(Token::Colon))
                .or_not()
                .then(predicate.clone())
                .then_ignore(just(Token::Newline))
                .map_with_span(|(not, predicate), span| AssertionExpr {
                    negated: not.is_some(),
                    predicate,
                    span: make_span(file, span, &line_index),
                })
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        );

    let fix_args = ident
        .clone()
        .separated_by(just(Token::Comma))
        .delimited_by(just(Token::LParen), just(Token::RParen));
    let fix_directive = choice::<_, Simple<Token>>((
        just(Token::KwEnableFeature)
            .ignore_then(fix_args.clone())
            .try_map(|args: Vec<String>, span| {
                let [var, feature, target]: [String; 3] = args.try_into().map_err(|_| {
                    Simple::custom(span.clone(), "enable-feature takes (variable, feature, variable)")
                })?;
                Ok(FixDirective::EnableFeature {
                    var,
                    feature,
                    target,
                    span: make_span(file, span, &line_index),
                })
            }),
        just(Token::KwRemoveDependency)
            .ignore_then(fix_args.clone())
            .try_map(|args: Vec<String>, span| {
                let [from, to]: [String; 2] = args.try_into().map_err(|_| {
                    Simple::custom(span.clone(), "remove-dependency takes (variable, variable)")
                })?;
                Ok(FixDirective::RemoveDependency {
                    from,
                    to,
                    span: make_span(file, span, &line_index),
                })
            }),
        just(Token::KwAddDependency)
            .ignore_then(fix_args.clone())
            .try_map(|args: Vec<String>, span| {
                if !(2..=3).contains(&args.len()) {
                    return Err(Simple::custom(
                        span,
                        "add-dependency takes (variable, variable[, feature])",
                    ));
                }
                let mut args = args.into_iter();
                match (args.next(), args.next(), args.next()) {
                    (Some(from), Some(to), feature) => Ok(FixDirective::AddDependency {
                        from,
                        to,
                        feature,
                        span: make_span(file, span, &line_index),
                    }),
                    _ => Err(Simple::custom(
                        span,
                        "add-dependency takes (variable, variable[, feature])",
                    )),
                }
            }),
    ));

    let otherwise_block = just(Token::KwOtherwise)
        .ignore_then(just(Token::Colon))
        .ignore_then(just(Token::Newline))
        .ignore_then(
            just(Token::KwError)
                .ignore_then(just(Token::Colon))
                .ignore_then(string.clone())
                .then_ignore(just(Token::Newline))
                .then(
                    just(Token::KwAutoFix)
                        .ignore_then(just(Token::Colon))
                        .ignore_then(fix_directive)
                        .then_ignore(just(Token::Newline))
                        .or_not(),
                )
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        );

    let rule = just(Token::KwTest)
        .ignore_then(just(Token::Colon))
        .ignore_then(ident.clone())
        .then_ignore(just(Token::Newline))
        .then(
            given_block
                .then(then_block)
                .then(otherwise_block)
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        )
        .map_with_span(|(name, ((given, assertion), (message, fix))), span| RuleDef {
            name,
            given,
            assertion,
            message,
            fix,
            span: make_span(file, span, &line_index),
        });

    let file_parser = rule
        .repeated()
        .map(|rules| RuleFile { rules })
        .then_ignore(end());

    let (parsed, parse_errs) = file_parser.parse_recovery(stream);
    if !parse_errs.is_empty() {
        let errs = parse_errs
            .into_iter()
            .map(|e| to_parse_error(e, file, &line_index))
            .collect::<Vec<_>>();
        return Err(errs);
    }

    Ok(parsed.unwrap_or(RuleFile { rules: Vec::new() }))
}
