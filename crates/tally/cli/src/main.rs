//! Tally CLI - verify annotated contract fixtures
//!
//! This CLI lets contract authors and verifier developers:
//! - Verify fixture files against their contract models
//! - Inspect the directives a fixture declares
//! - List the registered models
//! - Show the resolved configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tally_verify::{Bounds, TallyConfig, ToolPaths};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{directives, models, verify};
use error::CliResult;
use output::{print_error, print_single, OutputFormat};

/// Tally CLI application
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Tally - resource-ledger verification for annotated contracts", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Verify fixtures against their contract models
    Verify(verify::VerifyArgs),

    /// List the directives of a fixture
    Directives {
        /// Fixture file
        file: PathBuf,
    },

    /// List registered contract models
    Models,

    /// Show configuration
    Config,
}

/// What `tally config` prints
#[derive(Serialize)]
struct ResolvedConfig<'a> {
    path: Option<PathBuf>,
    bounds: &'a Bounds,
    tools: ToolPaths,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}

/// Run a command. `Ok(false)` means the command ran but found failures.
fn run(cli: Cli) -> CliResult<bool> {
    // Load config
    let config = TallyConfig::load(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Verify(args) => verify::execute(args, &config, cli.output, cli.verbose),
        Commands::Directives { file } => directives::execute(file, cli.output).map(|()| true),
        Commands::Models => models::execute(cli.output).map(|()| true),
        Commands::Config => {
            let resolved = ResolvedConfig {
                path: cli.config.or_else(TallyConfig::default_config_path),
                bounds: &config.bounds,
                tools: config.tools.clone().resolve(),
            };
            print_single(&resolved, cli.output)?;
            Ok(true)
        }
    }
}
