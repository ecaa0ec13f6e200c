use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "lattice-cli",
    version,
    about = "Dependency and feature rule checker for crate workspaces"
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a rule file against a crate universe snapshot
    Check(CheckArgs),
    /// Inspect rule definitions
    Rules(RulesArgs),
}

#[derive(Parser)]
struct CheckArgs {
    /// Rule definition file
    #[arg(long, value_name = "PATH")]
    rules: PathBuf,

    /// Crate universe snapshot (JSON)
    #[arg(long, value_name = "PATH")]
    universe: PathBuf,

    /// Per-rule binding enumeration budget
    #[arg(long, value_name = "N", default_value_t = 1_000_000)]
    binding_budget: usize,

    /// Output the full report as JSON instead of key=value lines
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommands,
}

#[derive(Subcommand)]
enum RulesCommands {
    /// Parse a rule file and print the typed rules as JSON
    Show(RulesShowArgs),
}

#[derive(Parser)]
struct RulesShowArgs {
    /// Rule definition file
    #[arg(value_name = "PATH")]
    rules: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let result = match cli.command {
        Commands::Check(args) => commands::check::run_check(args),
        Commands::Rules(args) => match args.command {
            RulesCommands::Show(args) => commands::rules::run_show(args),
        },
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    }
}

fn init_logging(quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level).format_timestamp(None);
    let _ = builder.try_init();
}
