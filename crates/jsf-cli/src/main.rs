//! # jsf CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// jsf: JSON-Schema form-state engine.
///
/// Resolves schemas, synthesizes default form data, builds field id trees,
/// and validates form data, reading JSON or YAML files.
#[derive(Parser, Debug)]
#[command(name = "jsf", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the resolved root schema.
    Resolve(jsf_cli::resolve::ResolveArgs),
    /// Print form data with defaults filled in.
    Defaults(jsf_cli::defaults::DefaultsArgs),
    /// Print the field id tree.
    Ids(jsf_cli::ids::IdsArgs),
    /// Validate form data.
    Validate(jsf_cli::validate::ValidateArgs),
    /// Print the whole form state.
    State(jsf_cli::state::StateArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env();
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let output = match &cli.command {
        Commands::Resolve(args) => jsf_cli::resolve::run(args)?,
        Commands::Defaults(args) => jsf_cli::defaults::run(args)?,
        Commands::Ids(args) => jsf_cli::ids::run(args)?,
        Commands::Validate(args) => jsf_cli::validate::run(args)?,
        Commands::State(args) => jsf_cli::state::run(args)?,
    };

    println!("{}", serde_json::to_string_pretty(&output.value)?);
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
