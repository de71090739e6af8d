//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use sihat_map::cache::FailureReason;
use sihat_map::config::ConfigFileError;
use sihat_map::fetch::FetchError;
use sihat_map::layer::DescriptorError;
use std::fmt;
use std::path::PathBuf;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// The built-in layer catalog failed validation
    Catalog(DescriptorError),
    /// Failed to create the HTTP client
    HttpClient(FetchError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Input file is not JSON
    InvalidJson {
        path: PathBuf,
        error: serde_json::Error,
    },
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
    /// Map layers could not be prepared
    Layers(FailureReason),
    /// Invalid command-line argument
    InvalidArgument(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the file shown by: sihat-map config path");
                eprintln!("Or recreate it with:      sihat-map config init --force");
            }
            CliError::Layers(FailureReason::Network { .. }) => {
                eprintln!();
                eprintln!("Dataset paths such as /data/apotek.json need a base URL.");
                eprintln!("Set [data] base_url in config.ini or pass --base-url.");
            }
            _ => {}
        }

        process::exit(match self {
            CliError::InvalidArgument(_) => 2,
            _ => 1,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Catalog(e) => write!(f, "Invalid layer catalog: {}", e),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path.display(), error)
            }
            CliError::InvalidJson { path, error } => {
                write!(f, "'{}' is not valid JSON: {}", path.display(), error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::Layers(e) => write!(f, "Failed to prepare map layers: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Catalog(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::InvalidJson { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Layers(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<DescriptorError> for CliError {
    fn from(e: DescriptorError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<FailureReason> for CliError {
    fn from(e: FailureReason) -> Self {
        CliError::Layers(e)
    }
}
