//! In-memory map engine.

use super::traits::MapEngine;
use super::types::{
    EaseOptions, EngineError, FitOptions, FitRecord, HandlerId, LayerEventHandler, LayerSpec,
    PointerEvent, PointerEventKind, PopupCommand, PopupKind, PopupSpec, RenderedFeature,
    Visibility,
};
use crate::geometry::{polygon_contains, Bounds, FeatureCollection, Geometry, LngLat, Position};
use crate::icon::DecodedImage;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Pick radius for point and line features, in degrees (roughly 100 m).
pub const DEFAULT_HIT_TOLERANCE: f64 = 0.001;

const VIEWPORT_WIDTH: f64 = 800.0;
const VIEWPORT_HEIGHT: f64 = 600.0;
const TILE_SIZE: f64 = 256.0;
const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 22.0;

/// Registration counters, cumulative across style reloads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineCounters {
    pub sources_added: usize,
    pub layers_added: usize,
    pub images_added: usize,
    pub data_updates: usize,
    pub style_loads: usize,
}

struct Registration {
    id: HandlerId,
    event: PointerEventKind,
    layer_id: String,
    handler: LayerEventHandler,
}

/// A map engine that keeps style state in memory and renders nothing.
///
/// Behaves like a browser renderer where it matters to the layer manager:
/// duplicate sources, layers and images are rejected, event handlers survive
/// a style reload, and hit testing honours layer visibility and zoom range.
pub struct HeadlessEngine {
    sources: HashMap<String, Arc<FeatureCollection>>,
    layers: Vec<LayerSpec>,
    images: HashMap<String, DecodedImage>,
    handlers: Vec<Registration>,
    next_handler: u64,
    hovered: HashSet<String>,
    hover_popup: Option<PopupSpec>,
    pinned_popup: Option<PopupSpec>,
    center: LngLat,
    zoom: f64,
    last_fit: Option<FitRecord>,
    last_ease: Option<EaseOptions>,
    hit_tolerance: f64,
    counters: EngineCounters,
}

impl HeadlessEngine {
    /// Creates an engine with an empty style and the camera at `center`.
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            sources: HashMap::new(),
            layers: Vec::new(),
            images: HashMap::new(),
            handlers: Vec::new(),
            next_handler: 1,
            hovered: HashSet::new(),
            hover_popup: None,
            pinned_popup: None,
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            last_fit: None,
            last_ease: None,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            counters: EngineCounters {
                style_loads: 1,
                ..EngineCounters::default()
            },
        }
    }

    pub fn with_hit_tolerance(mut self, degrees: f64) -> Self {
        self.hit_tolerance = degrees;
        self
    }

    /// Replace the style: sources, layers, images and popups are dropped,
    /// event handlers are kept.
    pub fn reload_style(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.images.clear();
        self.hovered.clear();
        self.hover_popup = None;
        self.pinned_popup = None;
        self.counters.style_loads += 1;
        debug!(
            handlers = self.handlers.len(),
            "Style reloaded, handlers retained"
        );
    }

    /// Move the pointer to `at`, firing enter/move/leave handlers.
    ///
    /// Returns the number of handlers invoked.
    pub fn pointer_move(&mut self, at: LngLat) -> usize {
        let mut fired = 0;
        let mut commands = Vec::new();

        for layer_id in self.handled_layers() {
            let features = self.layer_hits(&layer_id, at);
            let mut events = Vec::new();
            if features.is_empty() {
                if self.hovered.remove(&layer_id) {
                    events.push(PointerEventKind::MouseLeave);
                }
            } else {
                if self.hovered.insert(layer_id.clone()) {
                    events.push(PointerEventKind::MouseEnter);
                }
                events.push(PointerEventKind::MouseMove);
            }

            for kind in events {
                let event = PointerEvent {
                    kind,
                    layer_id: layer_id.clone(),
                    lng_lat: at,
                    features: features.clone(),
                };
                fired += self.invoke(&event, &mut commands);
            }
        }

        self.apply(commands);
        fired
    }

    /// Click at `at`, firing click handlers of every layer hit.
    ///
    /// Returns the number of handlers invoked.
    pub fn click(&mut self, at: LngLat) -> usize {
        let mut fired = 0;
        let mut commands = Vec::new();

        for layer_id in self.handled_layers() {
            let features = self.layer_hits(&layer_id, at);
            if features.is_empty() {
                continue;
            }
            let event = PointerEvent {
                kind: PointerEventKind::Click,
                layer_id,
                lng_lat: at,
                features,
            };
            fired += self.invoke(&event, &mut commands);
        }

        self.apply(commands);
        fired
    }

    /// Dismiss the pinned popup, as its close button would.
    pub fn close_pinned_popup(&mut self) {
        self.pinned_popup = None;
    }

    pub fn hover_popup(&self) -> Option<&PopupSpec> {
        self.hover_popup.as_ref()
    }

    pub fn pinned_popup(&self) -> Option<&PopupSpec> {
        self.pinned_popup.as_ref()
    }

    pub fn center(&self) -> LngLat {
        self.center
    }

    /// Move the camera without animation.
    pub fn jump_to(&mut self, center: LngLat, zoom: f64) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn last_fit(&self) -> Option<FitRecord> {
        self.last_fit
    }

    pub fn last_ease(&self) -> Option<EaseOptions> {
        self.last_ease
    }

    pub fn counters(&self) -> EngineCounters {
        self.counters
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layer ids in draw order, bottom first.
    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    pub fn layer_visibility(&self, id: &str) -> Option<Visibility> {
        self.layer(id).map(LayerSpec::visibility)
    }

    pub fn image(&self, name: &str) -> Option<&DecodedImage> {
        self.images.get(name)
    }

    /// Total registered event handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Handlers registered for one event on one layer.
    pub fn handlers_for(&self, event: PointerEventKind, layer_id: &str) -> usize {
        self.handlers
            .iter()
            .filter(|r| r.event == event && r.layer_id == layer_id)
            .count()
    }

    /// Symbol layers whose icon image is absent from the image table.
    pub fn layers_missing_icons(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|l| l.icon_image().is_some_and(|name| !self.images.contains_key(name)))
            .map(|l| l.id.clone())
            .collect()
    }

    fn handled_layers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        // Topmost layers get their events first.
        let mut ordered: Vec<String> = self
            .layers
            .iter()
            .rev()
            .filter(|l| self.handlers.iter().any(|r| r.layer_id == l.id))
            .map(|l| l.id.clone())
            .collect();
        ordered.retain(|id| seen.insert(id.clone()));
        // Handlers on layers no longer in the style still need leave events.
        for id in self.hovered.iter() {
            if !seen.contains(id) {
                ordered.push(id.clone());
            }
        }
        ordered
    }

    fn layer_hits(&self, layer_id: &str, at: LngLat) -> Vec<crate::geometry::Feature> {
        self.query_rendered_features(at, &[layer_id.to_string()])
            .into_iter()
            .map(|r| r.feature)
            .collect()
    }

    fn invoke(&self, event: &PointerEvent, commands: &mut Vec<PopupCommand>) -> usize {
        let mut fired = 0;
        for registration in self
            .handlers
            .iter()
            .filter(|r| r.event == event.kind && r.layer_id == event.layer_id)
        {
            trace!(handler = %registration.id, layer = %event.layer_id, event = ?event.kind, "Dispatching");
            commands.extend((registration.handler)(event));
            fired += 1;
        }
        fired
    }

    fn apply(&mut self, commands: Vec<PopupCommand>) {
        for command in commands {
            match command {
                PopupCommand::Show(popup) => match popup.kind {
                    PopupKind::Hover => self.hover_popup = Some(popup),
                    PopupKind::Pinned => self.pinned_popup = Some(popup),
                },
                PopupCommand::Close(PopupKind::Hover) => self.hover_popup = None,
                PopupCommand::Close(PopupKind::Pinned) => self.pinned_popup = None,
            }
        }
    }

    fn is_rendered(&self, layer: &LayerSpec) -> bool {
        layer.visibility() == Visibility::Visible && layer.covers_zoom(self.zoom)
    }

    fn geometry_hit(&self, geometry: &Geometry, at: LngLat) -> bool {
        let tolerance = self.hit_tolerance;
        let near = |p: &Position| {
            p.len() >= 2 && (p[0] - at.lng).hypot(p[1] - at.lat) <= tolerance
        };
        let near_line = |line: &[Position]| {
            line.windows(2)
                .any(|w| segment_distance(&w[0], &w[1], at) <= tolerance)
        };

        match geometry {
            Geometry::Point { coordinates } => near(coordinates),
            Geometry::MultiPoint { coordinates } => coordinates.iter().any(near),
            Geometry::LineString { coordinates } => near_line(coordinates.as_slice()),
            Geometry::MultiLineString { coordinates } => {
                coordinates.iter().any(|line| near_line(line.as_slice()))
            }
            Geometry::Polygon { coordinates } => polygon_contains(coordinates, at.lng, at.lat),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .any(|polygon| polygon_contains(polygon, at.lng, at.lat)),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().any(|g| self.geometry_hit(g, at))
            }
        }
    }
}

fn segment_distance(a: &Position, b: &Position, at: LngLat) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return f64::INFINITY;
    }
    let (ax, ay, bx, by) = (a[0], a[1], b[0], b[1]);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((at.lng - ax) * dx + (at.lat - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    (ax + t * dx - at.lng).hypot(ay + t * dy - at.lat)
}

/// Zoom at which `span` degrees fill `pixels` screen pixels.
fn zoom_for_span(span: f64, pixels: f64) -> f64 {
    if span <= 0.0 || pixels <= 0.0 {
        return MAX_ZOOM;
    }
    (pixels * 360.0 / (TILE_SIZE * span)).log2()
}

impl MapEngine for HeadlessEngine {
    fn add_source(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<(), EngineError> {
        if self.sources.contains_key(id) {
            return Err(EngineError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), data);
        self.counters.sources_added += 1;
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn source_data(&self, id: &str) -> Option<Arc<FeatureCollection>> {
        self.sources.get(id).cloned()
    }

    fn set_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<(), EngineError> {
        match self.sources.get_mut(id) {
            Some(slot) => {
                *slot = data;
                self.counters.data_updates += 1;
                Ok(())
            }
            None => Err(EngineError::MissingSource(id.to_string())),
        }
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError> {
        if self.has_layer(&spec.id) {
            return Err(EngineError::DuplicateLayer(spec.id));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(EngineError::MissingSource(spec.source));
        }
        if let Some(name) = spec.icon_image() {
            if !self.images.contains_key(name) {
                warn!(layer = %spec.id, image = name, "Layer references a missing image");
            }
        }
        self.layers.push(spec);
        self.counters.layers_added += 1;
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn set_layout_property(
        &mut self,
        layer_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == layer_id)
            .ok_or_else(|| EngineError::MissingLayer(layer_id.to_string()))?;
        layer.layout.insert(name.to_string(), value);
        Ok(())
    }

    fn add_image(&mut self, name: &str, image: DecodedImage) -> Result<(), EngineError> {
        if self.images.contains_key(name) {
            return Err(EngineError::DuplicateImage(name.to_string()));
        }
        if !image.is_valid() {
            return Err(EngineError::InvalidImage {
                name: name.to_string(),
                reason: format!(
                    "{}x{} with {} bytes",
                    image.width,
                    image.height,
                    image.rgba.len()
                ),
            });
        }
        self.images.insert(name.to_string(), image);
        self.counters.images_added += 1;
        Ok(())
    }

    fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    fn on(
        &mut self,
        event: PointerEventKind,
        layer_id: &str,
        handler: LayerEventHandler,
    ) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push(Registration {
            id,
            event,
            layer_id: layer_id.to_string(),
            handler,
        });
        id
    }

    fn off(&mut self, handler: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|r| r.id != handler);
        self.handlers.len() != before
    }

    fn query_rendered_features(&self, at: LngLat, layer_ids: &[String]) -> Vec<RenderedFeature> {
        let mut hits = Vec::new();
        for layer in self.layers.iter().rev() {
            if !layer_ids.is_empty() && !layer_ids.contains(&layer.id) {
                continue;
            }
            if !self.is_rendered(layer) {
                continue;
            }
            let Some(data) = self.sources.get(&layer.source) else {
                continue;
            };
            for feature in &data.features {
                if let Some(geometry) = &feature.geometry {
                    if self.geometry_hit(geometry, at) {
                        hits.push(RenderedFeature {
                            layer_id: layer.id.clone(),
                            feature: feature.clone(),
                        });
                    }
                }
            }
        }
        hits
    }

    fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions) {
        let padding = 2.0 * options.padding as f64;
        let zoom_x = zoom_for_span(bounds.max_x - bounds.min_x, VIEWPORT_WIDTH - padding);
        let zoom_y = zoom_for_span(bounds.max_y - bounds.min_y, VIEWPORT_HEIGHT - padding);
        self.center = bounds.center();
        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
        self.last_fit = Some(FitRecord { bounds, options });
        debug!(zoom = self.zoom, duration_ms = options.duration_ms, "Fitted bounds");
    }

    fn ease_to(&mut self, options: EaseOptions) {
        if let Some(center) = options.center {
            self.center = center;
        }
        if let Some(zoom) = options.zoom {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.last_ease = Some(options);
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn clear_popups(&mut self) {
        self.hover_popup = None;
        self.pinned_popup = None;
    }
}
