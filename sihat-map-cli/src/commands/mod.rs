//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`inspect`] - Load layers into a headless map
//! - [`layers`] - Layer catalog listing
//! - [`normalize`] - Dataset conversion

pub mod config;
pub mod inspect;
pub mod layers;
pub mod normalize;
