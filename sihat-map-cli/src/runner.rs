//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and client/runtime
//! creation to reduce duplication across command handlers.

use crate::error::CliError;
use sihat_map::config::ConfigFile;
use sihat_map::fetch::AsyncReqwestClient;
use sihat_map::logging::{init_logging_full, LoggingGuard};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// Logs go to the configured file. With `debug_mode` they are also
    /// printed to stdout at debug level.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "sihat-map.log".to_string());

        let logging_guard = init_logging_full(log_dir, &log_file, debug_mode, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("SIHAT map v{}", sihat_map::VERSION);
        info!("SIHAT map CLI: {} command", command);
    }

    /// HTTP client configured from `[http]`.
    pub fn http_client(&self) -> Result<AsyncReqwestClient, CliError> {
        AsyncReqwestClient::with_settings(self.config.http.timeout, &self.config.http.user_agent)
            .map_err(CliError::HttpClient)
    }

    /// Single-threaded runtime: every map operation runs on one thread.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}
