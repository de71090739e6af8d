//! Static per-layer configuration.

use super::expr::{check_color, ColorRamp, NumericExpr};
use crate::engine::{LayerSpec, RenderMode, Visibility};
use crate::interaction::PopupTemplate;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Highest zoom a descriptor may reference.
pub const MAX_ZOOM_LEVEL: f64 = 24.0;

/// Descriptor validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("layer id must be non-empty ASCII without whitespace: {0:?}")]
    InvalidId(String),

    #[error("layer {0} has no source url")]
    MissingSourceUrl(String),

    #[error("invalid zoom range {min:?}..{max:?}")]
    InvalidZoomRange { min: Option<f64>, max: Option<f64> },

    #[error("invalid colour: {0}")]
    InvalidColor(String),

    #[error("invalid colour ramp: {0}")]
    InvalidRamp(String),

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("invalid icon: {0}")]
    InvalidIcon(String),

    #[error("invalid paint value {name}: {value}")]
    InvalidPaint { name: &'static str, value: f64 },

    #[error("duplicate layer id or alias: {0}")]
    Duplicate(String),
}

/// Optional `[min, max)` zoom visibility bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ZoomRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Result<Self, DescriptorError> {
        let in_range = |z: Option<f64>| z.map_or(true, |z| (0.0..=MAX_ZOOM_LEVEL).contains(&z));
        let ordered = match (min, max) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        };
        if !in_range(min) || !in_range(max) || !ordered {
            return Err(DescriptorError::InvalidZoomRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// No bounds.
    pub fn any() -> Self {
        Self::default()
    }

    /// Only a lower bound.
    pub fn from_min(min: f64) -> Result<Self, DescriptorError> {
        Self::new(Some(min), None)
    }
}

/// Icon used by a symbol layer.
#[derive(Debug, Clone, PartialEq)]
pub struct IconRef {
    /// Name in the engine's image table
    pub name: String,
    pub asset_url: String,
    /// Decoded bitmaps larger than this are downsampled
    pub max_bitmap_dimension: u32,
    /// `icon-size` applied when drawing
    pub display_scale: f64,
}

/// Circle paint.
#[derive(Debug, Clone, PartialEq)]
pub struct CirclePaint {
    pub radius: f64,
    pub color: String,
    pub stroke_width: f64,
    pub stroke_color: String,
}

impl CirclePaint {
    /// A circle with the default 1px white stroke.
    pub fn new(radius: f64, color: &str) -> Self {
        Self {
            radius,
            color: color.to_string(),
            stroke_width: 1.0,
            stroke_color: "#ffffff".to_string(),
        }
    }
}

/// Choropleth paint.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPaint {
    pub value: NumericExpr,
    pub ramp: ColorRamp,
    pub opacity: f64,
    pub outline_color: String,
}

/// Heatmap paint with zoom-dependent radius and intensity.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapPaint {
    /// Per-feature weight; every feature weighs 1 when absent
    pub weight: Option<NumericExpr>,
    /// Weight mapped to full intensity
    pub weight_max: f64,
    /// `(zoom, pixels)` stops
    pub radius: Vec<(f64, f64)>,
    /// `(zoom, intensity)` stops
    pub intensity: Vec<(f64, f64)>,
    pub opacity: f64,
}

/// Render-mode specific paint configuration.
///
/// The variant decides the render mode, so paint rules of one mode can never
/// be attached to a layer of another.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintRules {
    Symbol { icon: IconRef, allow_overlap: bool },
    Circle(CirclePaint),
    Fill(FillPaint),
    Heatmap(HeatmapPaint),
}

impl PaintRules {
    pub fn render_mode(&self) -> RenderMode {
        match self {
            PaintRules::Symbol { .. } => RenderMode::Symbol,
            PaintRules::Circle(_) => RenderMode::Circle,
            PaintRules::Fill(_) => RenderMode::Fill,
            PaintRules::Heatmap(_) => RenderMode::Heatmap,
        }
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        let non_negative = |name: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(DescriptorError::InvalidPaint { name, value })
            }
        };
        let unit = |name: &'static str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(DescriptorError::InvalidPaint { name, value })
            }
        };

        match self {
            PaintRules::Symbol { icon, .. } => {
                if icon.name.trim().is_empty() || icon.asset_url.trim().is_empty() {
                    return Err(DescriptorError::InvalidIcon(
                        "icon needs a name and an asset url".into(),
                    ));
                }
                if icon.max_bitmap_dimension == 0 {
                    return Err(DescriptorError::InvalidIcon(format!(
                        "{}: max bitmap dimension must be positive",
                        icon.name
                    )));
                }
                non_negative("icon-size", icon.display_scale)
            }
            PaintRules::Circle(c) => {
                non_negative("circle-radius", c.radius)?;
                non_negative("circle-stroke-width", c.stroke_width)?;
                check_color(&c.color)?;
                check_color(&c.stroke_color)?;
                Ok(())
            }
            PaintRules::Fill(f) => {
                f.value.validate()?;
                unit("fill-opacity", f.opacity)?;
                check_color(&f.outline_color)?;
                Ok(())
            }
            PaintRules::Heatmap(h) => {
                if let Some(weight) = &h.weight {
                    weight.validate()?;
                }
                if !(h.weight_max.is_finite() && h.weight_max > 0.0) {
                    return Err(DescriptorError::InvalidPaint {
                        name: "heatmap-weight",
                        value: h.weight_max,
                    });
                }
                unit("heatmap-opacity", h.opacity)?;
                for stops in [&h.radius, &h.intensity] {
                    if stops.is_empty() || stops.windows(2).any(|w| w[1].0 <= w[0].0) {
                        return Err(DescriptorError::InvalidRamp(
                            "heatmap zoom stops must be ascending".into(),
                        ));
                    }
                    for &(_, v) in stops.iter() {
                        non_negative("heatmap stop", v)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn layout(&self) -> Map<String, Value> {
        let mut layout = Map::new();
        if let PaintRules::Symbol {
            icon,
            allow_overlap,
        } = self
        {
            layout.insert("icon-image".into(), json!(icon.name));
            layout.insert("icon-size".into(), json!(icon.display_scale));
            layout.insert("icon-allow-overlap".into(), json!(allow_overlap));
        }
        layout
    }

    fn paint(&self) -> Map<String, Value> {
        let value = match self {
            PaintRules::Symbol { .. } => json!({}),
            PaintRules::Circle(c) => json!({
                "circle-radius": c.radius,
                "circle-color": c.color,
                "circle-stroke-width": c.stroke_width,
                "circle-stroke-color": c.stroke_color,
            }),
            PaintRules::Fill(f) => json!({
                "fill-color": f.ramp.to_style(f.value.to_style()),
                "fill-opacity": f.opacity,
                "fill-outline-color": f.outline_color,
            }),
            PaintRules::Heatmap(h) => {
                let by_zoom = |stops: &[(f64, f64)]| {
                    let mut expr = vec![json!("interpolate"), json!(["linear"]), json!(["zoom"])];
                    for &(z, v) in stops {
                        expr.push(json!(z));
                        expr.push(json!(v));
                    }
                    Value::Array(expr)
                };
                let weight = match &h.weight {
                    Some(expr) => json!([
                        "interpolate", ["linear"], expr.to_style(),
                        0, 0,
                        h.weight_max, 1
                    ]),
                    None => json!(1),
                };
                json!({
                    "heatmap-weight": weight,
                    "heatmap-radius": by_zoom(h.radius.as_slice()),
                    "heatmap-intensity": by_zoom(h.intensity.as_slice()),
                    "heatmap-opacity": h.opacity,
                })
            }
        };
        value.as_object().cloned().unwrap_or_default()
    }
}

/// Configuration of one thematic layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    id: String,
    label: String,
    source_url: String,
    paint: PaintRules,
    zoom: ZoomRange,
    popup: Option<PopupTemplate>,
    aliases: Vec<String>,
}

impl LayerDescriptor {
    /// Validate and build a descriptor.
    pub fn new(
        id: &str,
        label: &str,
        source_url: &str,
        paint: PaintRules,
        zoom: ZoomRange,
    ) -> Result<Self, DescriptorError> {
        check_id(id)?;
        if source_url.trim().is_empty() {
            return Err(DescriptorError::MissingSourceUrl(id.to_string()));
        }
        paint.validate()?;
        Ok(Self {
            id: id.to_string(),
            label: label.to_string(),
            source_url: source_url.to_string(),
            paint,
            zoom,
            popup: None,
            aliases: Vec::new(),
        })
    }

    pub fn with_popup(mut self, popup: PopupTemplate) -> Self {
        self.popup = Some(popup);
        self
    }

    /// Another id the UI may use for this layer.
    pub fn with_alias(mut self, alias: &str) -> Result<Self, DescriptorError> {
        check_id(alias)?;
        self.aliases.push(alias.to_string());
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn paint(&self) -> &PaintRules {
        &self.paint
    }

    pub fn zoom(&self) -> ZoomRange {
        self.zoom
    }

    pub fn popup(&self) -> Option<&PopupTemplate> {
        self.popup.as_ref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn render_mode(&self) -> RenderMode {
        self.paint.render_mode()
    }

    pub fn icon(&self) -> Option<&IconRef> {
        match &self.paint {
            PaintRules::Symbol { icon, .. } => Some(icon),
            _ => None,
        }
    }

    /// Engine source id: `<id>-src`.
    pub fn source_id(&self) -> String {
        format!("{}-src", self.id)
    }

    /// Engine layer id: `<id>-layer`.
    pub fn layer_id(&self) -> String {
        format!("{}-layer", self.id)
    }

    /// Style layer for the engine, hidden.
    pub fn layer_spec(&self) -> LayerSpec {
        let mut layout = self.paint.layout();
        layout.insert("visibility".into(), Visibility::None.to_value());
        LayerSpec {
            id: self.layer_id(),
            source: self.source_id(),
            render_mode: self.render_mode(),
            min_zoom: self.zoom.min,
            max_zoom: self.zoom.max,
            layout,
            paint: self.paint.paint(),
        }
    }
}

fn check_id(id: &str) -> Result<(), DescriptorError> {
    if id.is_empty() || !id.is_ascii() || id.chars().any(char::is_whitespace) {
        return Err(DescriptorError::InvalidId(id.to_string()));
    }
    Ok(())
}
