//! SIHAT map layers - thematic health layers for the Banjarbaru map portal
//!
//! This library manages the thematic layers of an interactive map: it
//! normalizes heterogeneous geographic datasets, registers sources and
//! layers with a map engine, loads marker icons, caches datasets per URL
//! and binds hover and click popups.
//!
//! # High-Level API
//!
//! The [`manager`] module ties everything together:
//!
//! ```ignore
//! use sihat_map::manager::{LayerManager, ManagerOptions};
//!
//! let manager = LayerManager::new(engine, client, catalog, DatasetCache::new(), options);
//! manager.begin_style_load()?;
//! manager.on_style_loaded().await?;
//! manager.toggle_layer("puskesmas", true).await?;
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod geometry;
pub mod icon;
pub mod interaction;
pub mod layer;
pub mod logging;
pub mod manager;

/// Version of the library and CLI.
///
/// Synchronized across the workspace; injected from `Cargo.toml` at compile
/// time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
