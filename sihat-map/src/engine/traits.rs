//! The capability set the layer manager needs from a map renderer.

use super::types::{
    EaseOptions, EngineError, FitOptions, HandlerId, LayerEventHandler, LayerSpec,
    PointerEventKind, RenderedFeature,
};
use crate::geometry::{Bounds, FeatureCollection, LngLat};
use crate::icon::DecodedImage;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Shared handle to a live engine instance.
///
/// Lock it for synchronous calls only; never hold the guard across an await.
pub type EngineHandle<E> = Arc<Mutex<E>>;

/// A map renderer.
///
/// Mutating calls report conflicts as errors rather than ignoring them;
/// idempotency is the caller's job, checked through the `has_*` queries.
pub trait MapEngine: Send {
    /// Register a GeoJSON source.
    fn add_source(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<(), EngineError>;

    fn has_source(&self, id: &str) -> bool;

    /// Current data of a source.
    fn source_data(&self, id: &str) -> Option<Arc<FeatureCollection>>;

    /// Replace the data of an existing source.
    fn set_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<(), EngineError>;

    /// Add a style layer on top of the existing ones.
    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError>;

    fn has_layer(&self, id: &str) -> bool;

    fn set_layout_property(
        &mut self,
        layer_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), EngineError>;

    /// Add an image to the style's image table.
    fn add_image(&mut self, name: &str, image: DecodedImage) -> Result<(), EngineError>;

    fn has_image(&self, name: &str) -> bool;

    /// Subscribe to a pointer event on one layer.
    fn on(
        &mut self,
        event: PointerEventKind,
        layer_id: &str,
        handler: LayerEventHandler,
    ) -> HandlerId;

    /// Detach a handler. Returns false if it was not registered.
    fn off(&mut self, handler: HandlerId) -> bool;

    /// Features drawn at `at`, topmost layer first. An empty `layer_ids`
    /// queries every layer.
    fn query_rendered_features(&self, at: LngLat, layer_ids: &[String]) -> Vec<RenderedFeature>;

    fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions);

    fn ease_to(&mut self, options: EaseOptions);

    fn zoom(&self) -> f64;

    /// Close every open popup.
    fn clear_popups(&mut self);
}
