//! Value types exchanged with a map engine.

use crate::geometry::{Bounds, Feature, LngLat};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Errors reported by a map engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("source already exists: {0}")]
    DuplicateSource(String),

    #[error("layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("image already exists: {0}")]
    DuplicateImage(String),

    #[error("no such source: {0}")]
    MissingSource(String),

    #[error("no such layer: {0}")]
    MissingLayer(String),

    #[error("invalid image {name}: {reason}")]
    InvalidImage { name: String, reason: String },
}

/// How a layer draws its features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Bitmap icon per point
    Symbol,
    /// Primitive circle per point
    Circle,
    /// Area fill per polygon
    Fill,
    /// Density raster over points
    Heatmap,
}

impl RenderMode {
    /// Style-spec layer type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Symbol => "symbol",
            RenderMode::Circle => "circle",
            RenderMode::Fill => "fill",
            RenderMode::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout `visibility` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn from_bool(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }

    pub fn to_value(self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

/// A style layer definition handed to [`MapEngine::add_layer`].
///
/// [`MapEngine::add_layer`]: super::MapEngine::add_layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub render_mode: RenderMode,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub layout: Map<String, Value>,
    pub paint: Map<String, Value>,
}

impl LayerSpec {
    /// Layout visibility; absent means visible.
    pub fn visibility(&self) -> Visibility {
        match self.layout.get("visibility").and_then(Value::as_str) {
            Some("none") => Visibility::None,
            _ => Visibility::Visible,
        }
    }

    /// Whether the layer draws at `zoom` (min inclusive, max exclusive).
    pub fn covers_zoom(&self, zoom: f64) -> bool {
        self.min_zoom.map_or(true, |min| zoom >= min) && self.max_zoom.map_or(true, |max| zoom < max)
    }

    /// Name of the image referenced by `icon-image`, if any.
    pub fn icon_image(&self) -> Option<&str> {
        self.layout.get("icon-image").and_then(Value::as_str)
    }
}

/// Pointer events a handler can subscribe to, scoped to one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    MouseEnter,
    MouseMove,
    MouseLeave,
    Click,
}

/// Payload delivered to a layer event handler.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub layer_id: String,
    pub lng_lat: LngLat,
    /// Features of the layer under the pointer, topmost first
    pub features: Vec<Feature>,
}

/// Popup flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    /// Transient, follows the cursor, no close button
    Hover,
    /// Persistent, pinned at a click, dismissable
    Pinned,
}

/// A popup to display.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupSpec {
    pub kind: PopupKind,
    pub lng_lat: LngLat,
    pub html: String,
}

impl PopupSpec {
    pub fn close_button(&self) -> bool {
        self.kind == PopupKind::Pinned
    }
}

/// What a handler asks the engine to do with popups.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupCommand {
    Show(PopupSpec),
    Close(PopupKind),
}

/// Handler closure registered with [`MapEngine::on`].
///
/// Handlers never touch the engine directly; they return popup commands
/// which the engine applies.
///
/// [`MapEngine::on`]: super::MapEngine::on
pub type LayerEventHandler = Box<dyn Fn(&PointerEvent) -> Vec<PopupCommand> + Send + Sync>;

/// Opaque handle returned by [`MapEngine::on`], used to detach.
///
/// [`MapEngine::on`]: super::MapEngine::on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// A feature hit by [`MapEngine::query_rendered_features`].
///
/// [`MapEngine::query_rendered_features`]: super::MapEngine::query_rendered_features
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub layer_id: String,
    pub feature: Feature,
}

/// Camera fit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Padding in pixels on every side
    pub padding: u32,
    /// Animation duration in milliseconds
    pub duration_ms: u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: 40,
            duration_ms: 400,
        }
    }
}

/// Animated camera move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EaseOptions {
    pub center: Option<LngLat>,
    pub zoom: Option<f64>,
    pub duration_ms: u64,
}

/// Camera target recorded after a fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRecord {
    pub bounds: Bounds,
    pub options: FitOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(layout: Value, min: Option<f64>, max: Option<f64>) -> LayerSpec {
        LayerSpec {
            id: "x-layer".into(),
            source: "x-src".into(),
            render_mode: RenderMode::Circle,
            min_zoom: min,
            max_zoom: max,
            layout: layout.as_object().cloned().unwrap_or_default(),
            paint: Map::new(),
        }
    }

    #[test]
    fn test_visibility_defaults_to_visible() {
        assert_eq!(spec(json!({}), None, None).visibility(), Visibility::Visible);
        assert_eq!(
            spec(json!({"visibility": "none"}), None, None).visibility(),
            Visibility::None
        );
    }

    #[test]
    fn test_zoom_range_min_inclusive_max_exclusive() {
        let layer = spec(json!({}), Some(8.0), Some(12.0));
        assert!(!layer.covers_zoom(7.9));
        assert!(layer.covers_zoom(8.0));
        assert!(layer.covers_zoom(11.9));
        assert!(!layer.covers_zoom(12.0));
    }
}
