//! Manager options derived from the config file.

use crate::config::ConfigFile;
use crate::engine::FitOptions;
use crate::interaction::PointerKind;

/// Zoom change per zoom button press.
pub const ZOOM_STEP: f64 = 0.5;

/// Lowest zoom reachable with the zoom buttons.
pub const MIN_BUTTON_ZOOM: f64 = 3.0;

/// Highest zoom reachable with the zoom buttons.
pub const MAX_BUTTON_ZOOM: f64 = 18.0;

/// Zoom button animation.
pub const ZOOM_DURATION_MS: u64 = 300;

/// Behaviour knobs of a [`LayerManager`](super::LayerManager).
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerOptions {
    /// Joined to site-relative dataset and icon paths
    pub base_url: Option<String>,
    /// Layers shown once the style has loaded
    pub default_layers: Vec<String>,
    pub fit: FitOptions,
    pub pointer: PointerKind,
    /// Allow [`LayerManager::engine_handle`](super::LayerManager::engine_handle)
    pub expose_engine: bool,
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_duration_ms: u64,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::from_config(&ConfigFile::default())
    }
}

impl ManagerOptions {
    pub fn from_config(config: &ConfigFile) -> Self {
        Self {
            base_url: config.data.base_url.clone(),
            default_layers: config.map.default_layers.clone(),
            fit: FitOptions {
                padding: config.map.fit_padding,
                duration_ms: config.map.fit_duration_ms,
            },
            pointer: config.interaction.pointer.resolve(),
            expose_engine: config.debug.expose_engine,
            zoom_step: ZOOM_STEP,
            min_zoom: MIN_BUTTON_ZOOM,
            max_zoom: MAX_BUTTON_ZOOM,
            zoom_duration_ms: ZOOM_DURATION_MS,
        }
    }

    /// Same options without default layers.
    pub fn without_default_layers(mut self) -> Self {
        self.default_layers.clear();
        self
    }
}
