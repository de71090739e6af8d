//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use sihat_map::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a commented configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load()?;

    if !path.exists() {
        println!("; {} not found, showing defaults", path.display());
        println!();
    }

    println!("[data]");
    println!(
        "base_url = {}",
        config.data.base_url.as_deref().unwrap_or("(not set)")
    );
    println!();
    println!("[http]");
    println!("timeout = {}", config.http.timeout);
    println!("user_agent = {}", config.http.user_agent);
    println!();
    println!("[map]");
    println!("center = {},{}", config.map.center.lng, config.map.center.lat);
    println!("zoom = {}", config.map.zoom);
    println!("default_layers = {}", config.map.default_layers.join(", "));
    println!("fit_padding = {}", config.map.fit_padding);
    println!("fit_duration_ms = {}", config.map.fit_duration_ms);
    println!();
    println!("[interaction]");
    println!("pointer = {}", config.interaction.pointer);
    println!();
    println!("[debug]");
    println!("expose_engine = {}", config.debug.expose_engine);
    println!();
    println!("[logging]");
    println!("file = {}", config.logging.file.display());

    Ok(())
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists()? {
        println!("Created {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    }

    Ok(())
}
