//! User configuration in `~/.sihat/config.ini`.
//!
//! Settings structs live in [`settings`], constants in [`defaults`], INI
//! parsing in `parser` and serialization in `writer`. A missing file yields
//! the defaults.
//!
//! # Example
//!
//! ```
//! use sihat_map::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.map.default_layers, vec!["hospitals".to_string()]);
//! assert_eq!(config.map.fit_padding, 40);
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, DataSettings, DebugSettings, HttpSettings, InteractionSettings, LoggingSettings,
    MapSettings, PointerPreference,
};
