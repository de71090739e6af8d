//! Default values for every configuration key.

use super::file::config_directory;
use crate::geometry::LngLat;
use std::path::PathBuf;

/// HTTP timeout for dataset and icon requests.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Initial map centre: Banjarbaru.
pub const DEFAULT_CENTER: LngLat = LngLat {
    lng: 114.833,
    lat: -3.442,
};

/// Initial map zoom.
pub const DEFAULT_ZOOM: f64 = 12.0;

/// Layers shown once the style has loaded.
pub const DEFAULT_LAYERS: &[&str] = &["hospitals"];

/// Padding around fitted bounds, in pixels.
pub const DEFAULT_FIT_PADDING: u32 = 40;

/// Duration of the fit animation.
pub const DEFAULT_FIT_DURATION_MS: u64 = 400;

/// Highest zoom accepted for the initial view.
pub const MAX_INITIAL_ZOOM: f64 = 22.0;

/// Default log file location (`~/.sihat/sihat-map.log`).
pub fn default_log_file() -> PathBuf {
    config_directory().join("sihat-map.log")
}
