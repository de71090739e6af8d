//! SIHAT map CLI - Command-line interface
//!
//! A headless front end to the layer manager: list the thematic layers,
//! normalize dataset files, inspect layers against an in-memory map engine
//! and manage the configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use commands::config::ConfigCommands;
use commands::inspect::InspectArgs;
use commands::normalize::NormalizeArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "sihat-map")]
#[command(version = sihat_map::VERSION)]
#[command(about = "Thematic health map layers for SIHAT Banjarbaru", long_about = None)]
struct Cli {
    /// Print debug logs to stdout
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List thematic layers and the filter panel
    Layers,

    /// Convert a dataset file to a GeoJSON FeatureCollection
    Normalize(NormalizeArgs),

    /// Load layers into a headless map and report what would be shown
    Inspect(InspectArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Layers => commands::layers::run(),
        Commands::Normalize(args) => commands::normalize::run(args, cli.debug),
        Commands::Inspect(args) => commands::inspect::run(args, cli.debug),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
