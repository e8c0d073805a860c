//! Flowguard CLI Entry Point
//!
//! # Usage
//!
//! ```bash
//! # Validate a workflow
//! flowguard validate create_order.json
//!
//! # Fail on warnings too
//! flowguard validate create_order.json --strict
//!
//! # Simulate a run without side effects
//! flowguard dry-run create_order.json --verbose
//!
//! # Machine-readable output
//! flowguard dry-run create_order.json --json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

use flowguard::report::{render_simulation, render_validation, to_pretty_json, validation_json};
use flowguard::{load_workflow, Simulator, Validator, ValidatorConfig, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "flowguard")]
#[command(about = "Validate and dry-run declarative API workflow definitions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging and detailed reports
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run static checks on a workflow definition
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },
    /// Simulate a workflow run without side effects
    DryRun {
        /// Path to workflow JSON file
        file: PathBuf,
    },
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Validates a workflow file. Returns whether it passed.
fn validate(
    file: &Path,
    strict: bool,
    verbose: bool,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let workflow = load_workflow(file)?;
    let report = Validator::new(ValidatorConfig { strict }).validate(&workflow);
    let source = file.display().to_string();

    if json {
        println!("{}", to_pretty_json(&validation_json(&source, &report))?);
    } else {
        print!("{}", render_validation(&source, &report, verbose));
    }

    Ok(report.passed())
}

/// Simulates a workflow file. Returns whether the run reached DONE.
fn dry_run(file: &Path, verbose: bool, json: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let workflow = load_workflow(file)?;
    let outcome = Simulator::new().run(&workflow);

    if json {
        println!("{}", to_pretty_json(&outcome)?);
    } else {
        print!("{}", render_simulation(&outcome, verbose));
    }

    Ok(outcome.succeeded())
}

/// Main application entry point.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    info!("{} v{}", APP_NAME, VERSION);

    match cli.command {
        Commands::Validate { file, strict } => validate(&file, strict, cli.verbose, cli.json),
        Commands::DryRun { file } => dry_run(&file, cli.verbose, cli.json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
