use lattice_core::{evaluate, DepGraph, EvalOpts};

use lattice_cli::{load_rules, load_universe, render_text_report};

use crate::CheckArgs;

pub fn run_check(args: CheckArgs) -> Result<i32, String> {
    let universe = load_universe(&args.universe)?;
    let rules = load_rules(&args.rules)?;
    log::info!(
        "loaded {} crates and {} rules",
        universe.len(),
        rules.len()
    );

    let graph = DepGraph::build(&universe);
    let opts = EvalOpts {
        binding_budget: args.binding_budget,
    };
    let report = evaluate(&universe, &graph, &rules, &opts);

    for error in &report.errors {
        log::warn!("{}", error);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
    } else {
        print!("{}", render_text_report(&report));
    }

    Ok(if report.passed() { 0 } else { 1 })
}
