//! Tripcast CLI - inspect and maintain the lookup cache.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tripcast::config::{ConfigFile, LoggingSettings};
use tripcast::logging::init_logging;

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "tripcast",
    version = tripcast::VERSION,
    about = "Trip weather lookup cache tools"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or modify cached geocodes and forecasts
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = ConfigFile::load()
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingSettings::default());
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    let _guard = init_logging(&logging);

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Cache { action } => commands::cache::run(action).await,
        Commands::Config { command } => commands::config::run(command),
    }
}
