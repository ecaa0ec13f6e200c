use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use lattice_core::{Report, Rule, Universe};

/// Read and validate a crate universe snapshot (JSON).
pub fn load_universe(path: &Path) -> Result<Universe, String> {
    let raw =
        fs::read_to_string(path).map_err(|err| format!("read {}: {}", path.display(), err))?;
    let universe: Universe =
        serde_json::from_str(&raw).map_err(|err| format!("parse {}: {}", path.display(), err))?;
    universe
        .validate()
        .map_err(|err| format!("{}: {}", path.display(), err))?;
    Ok(universe)
}

/// Read, parse and lower a rule definition file.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, String> {
    let raw =
        fs::read_to_string(path).map_err(|err| format!("read {}: {}", path.display(), err))?;
    let file = path.display().to_string();
    let parsed = lattice_dsl::parse_rules(&raw, &file).map_err(|errs| {
        errs.iter()
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    lattice_dsl::lower_rules(parsed).map_err(|errs| errs.join("\n"))
}

/// Key=value rendering of a report, one line per violation and error.
/// The line order mirrors the report, so equal reports render equal text.
pub fn render_text_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "rules_fingerprint={}", report.rules_fingerprint);
    let _ = writeln!(out, "violations={}", report.violations.len());
    let _ = writeln!(out, "errors={}", report.errors.len());
    for violation in &report.violations {
        let binding = violation
            .binding
            .iter()
            .map(|(var, id)| format!("{}={}", var, id))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "violation rule={} binding={} message={}",
            violation.rule, binding, violation.message
        );
        if let Some(path) = &violation.path {
            let _ = writeln!(out, "  path: {}", path.join(" -> "));
        }
        if let Some(fix) = &violation.fix {
            let _ = writeln!(out, "  fix: {}", fix);
        }
    }
    for error in &report.errors {
        let _ = writeln!(out, "error {}", error);
    }
    let _ = writeln!(out, "passed={}", report.passed());
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lattice_core::{CrateId, FixAction, Violation};

    use super::*;

    #[test]
    fn text_report_lists_violations_and_fixes() {
        let report = Report {
            rules_fingerprint: "abc123".to_string(),
            violations: vec![Violation {
                rule: "no-frame-deps".to_string(),
                binding: BTreeMap::from([
                    ("A".to_string(), CrateId::new("sp-core")),
                    ("B".to_string(), CrateId::new("frame-system")),
                ]),
                message: "sp-core must not depend on frame-system".to_string(),
                path: None,
                fix: Some(FixAction::RemoveDependency {
                    from: CrateId::new("sp-core"),
                    to: CrateId::new("frame-system"),
                }),
            }],
            errors: vec![],
        };
        let text = render_text_report(&report);
        assert!(text.contains("rules_fingerprint=abc123"));
        assert!(text.contains("violation rule=no-frame-deps binding=A=sp-core,B=frame-system"));
        assert!(text.contains("fix: remove-dependency from=sp-core to=frame-system"));
        assert!(text.ends_with("passed=false\n"));
    }

    #[test]
    fn load_rules_reports_parse_location() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.lat");
        fs::write(&path, "test broken\n").expect("write rules");
        let err = load_rules(&path).expect_err("expected load failure");
        assert!(err.contains("broken.lat"));
    }
}
