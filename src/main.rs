//! fitcheck - size recommendations from product page size charts and selectors

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use fitcheck::cli::{Cli, Commands, MeasurementCommands};
use fitcheck::error::Result;

mod commands;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{} {}", "Hint:".yellow(), hint);
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr; `FITCHECK_LOG` takes the usual filter syntax
fn init_logging(verbose: bool) {
    let default = if verbose { "fitcheck=debug" } else { "fitcheck=warn" };
    let filter = EnvFilter::try_from_env("FITCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            url,
            file,
            json,
            output,
            no_wait,
        } => commands::cmd_analyze(&url, file.as_deref(), json, output.as_deref(), no_wait),

        Commands::Eligible { url, json } => commands::cmd_eligible(&url, json),

        Commands::Measurements(MeasurementCommands::Set {
            gender,
            bust,
            waist,
            hips,
            height,
            inseam,
        }) => commands::cmd_measurements_set(gender, bust, waist, hips, height, inseam),
        Commands::Measurements(MeasurementCommands::Show { json }) => {
            commands::cmd_measurements_show(json)
        }
        Commands::Measurements(MeasurementCommands::Clear { yes }) => {
            commands::cmd_measurements_clear(yes)
        }

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
