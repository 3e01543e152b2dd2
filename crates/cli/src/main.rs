/// Entry point for the murk CLI, a source-to-source obfuscation tool.
///
/// This module parses command-line arguments, loads the optional configuration file,
/// initializes logging and dispatches to the `obfuscate`, `names` and `render` subcommands.
use clap::Parser;
use murk_cli::commands::{Cmd, Command};
use murk_cli::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line interface for murk.
///
/// murk renames identifiers, encodes string literals, inserts junk functions, flattens
/// conditionals into selector calls and encrypts function bodies.
#[derive(Parser)]
#[command(name = "murk")]
#[command(about = "murk: source-to-source obfuscator")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// JSON configuration file (LLM endpoint, model, name hint, reserve slack)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every per-node decision
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Runs the murk CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    cli.command.execute(&config).await
}
