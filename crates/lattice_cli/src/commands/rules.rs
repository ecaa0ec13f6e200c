use lattice_cli::load_rules;

use crate::RulesShowArgs;

pub fn run_show(args: RulesShowArgs) -> Result<i32, String> {
    let rules = load_rules(&args.rules)?;
    let json =
        serde_json::to_string_pretty(&rules).map_err(|err| format!("json encode: {}", err))?;
    println!("{}", json);
    Ok(0)
}
