//! Per-layer runtime state and idempotent engine registration.

use super::catalog::LayerCatalog;
use super::descriptor::LayerDescriptor;
use crate::cache::FailureReason;
use crate::engine::{EngineError, MapEngine, Visibility};
use crate::geometry::FeatureCollection;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<RegistryError> for FailureReason {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownLayer(id) => FailureReason::UnknownLayer(id),
            RegistryError::Engine(e) => FailureReason::Engine(e),
        }
    }
}

/// Runtime state of one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerRuntimeState {
    pub source_registered: bool,
    pub layer_registered: bool,
    pub visible: bool,
    /// Last data pushed to the source; survives a style reload
    pub cached_data: Option<Arc<FeatureCollection>>,
    pub interaction_handles_attached: bool,
}

/// Owns the runtime state of every layer and mediates all source and layer
/// mutations on the engine.
#[derive(Debug)]
pub struct LayerRegistry {
    catalog: Arc<LayerCatalog>,
    states: HashMap<String, LayerRuntimeState>,
}

impl LayerRegistry {
    pub fn new(catalog: Arc<LayerCatalog>) -> Self {
        Self {
            catalog,
            states: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<LayerCatalog> {
        &self.catalog
    }

    fn descriptor(&self, id: &str) -> Result<&LayerDescriptor, RegistryError> {
        self.catalog
            .resolve(id)
            .ok_or_else(|| RegistryError::UnknownLayer(id.to_string()))
    }

    /// Create the source (empty) and the layer (hidden) if they are missing.
    ///
    /// Existing sources and layers are left untouched, so any number of calls
    /// leaves exactly one of each.
    pub fn ensure<E: MapEngine>(&mut self, engine: &mut E, id: &str) -> Result<(), RegistryError> {
        let descriptor = self.descriptor(id)?;
        let (key, source_id, spec) = (
            descriptor.id().to_string(),
            descriptor.source_id(),
            descriptor.layer_spec(),
        );

        if !engine.has_source(&source_id) {
            engine.add_source(&source_id, Arc::new(FeatureCollection::empty()))?;
            debug!(layer = %key, source = %source_id, "Source registered");
        }

        let layer_id = spec.id.clone();
        if !engine.has_layer(&layer_id) {
            engine.add_layer(spec)?;
            debug!(layer = %key, "Layer registered");
        }

        let state = self.states.entry(key).or_default();
        state.source_registered = true;
        state.layer_registered = true;
        Ok(())
    }

    /// Show or hide a layer.
    ///
    /// A no-op returning `Ok(false)` when the layer is not registered on the
    /// engine yet.
    pub fn set_visible<E: MapEngine>(
        &mut self,
        engine: &mut E,
        id: &str,
        visible: bool,
    ) -> Result<bool, RegistryError> {
        let descriptor = self.descriptor(id)?;
        let (key, layer_id) = (descriptor.id().to_string(), descriptor.layer_id());

        if !engine.has_layer(&layer_id) {
            trace!(layer = %key, "Visibility change before registration ignored");
            return Ok(false);
        }

        engine.set_layout_property(
            &layer_id,
            "visibility",
            Visibility::from_bool(visible).to_value(),
        )?;
        self.states.entry(key).or_default().visible = visible;
        Ok(true)
    }

    /// Remember `data` for the layer and push it into the live source.
    ///
    /// Applied regardless of visibility. Returns `Ok(false)` when the source
    /// is not registered; the data is still kept for the next registration.
    pub fn apply_data<E: MapEngine>(
        &mut self,
        engine: &mut E,
        id: &str,
        data: Arc<FeatureCollection>,
    ) -> Result<bool, RegistryError> {
        let descriptor = self.descriptor(id)?;
        let (key, source_id) = (descriptor.id().to_string(), descriptor.source_id());

        let applied = if engine.has_source(&source_id) {
            engine.set_data(&source_id, Arc::clone(&data))?;
            debug!(layer = %key, features = data.len(), "Source data set");
            true
        } else {
            false
        };

        self.states.entry(key).or_default().cached_data = Some(data);
        Ok(applied)
    }

    /// Record whether interaction handlers are attached for a layer.
    pub fn mark_bound(&mut self, id: &str, bound: bool) {
        if let Some(descriptor) = self.catalog.resolve(id) {
            self.states
                .entry(descriptor.id().to_string())
                .or_default()
                .interaction_handles_attached = bound;
        }
    }

    /// Forget engine registrations after a style reload. Visibility and
    /// cached data are kept so they can be re-applied.
    pub fn reset_for_reload(&mut self) {
        for state in self.states.values_mut() {
            state.source_registered = false;
            state.layer_registered = false;
            state.interaction_handles_attached = false;
        }
    }

    /// Drop every runtime state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn state(&self, id: &str) -> Option<&LayerRuntimeState> {
        let descriptor = self.catalog.resolve(id)?;
        self.states.get(descriptor.id())
    }

    /// Visible layer ids in catalog order.
    pub fn visible_layers(&self) -> Vec<String> {
        self.catalog
            .descriptors()
            .iter()
            .filter(|d| self.states.get(d.id()).is_some_and(|s| s.visible))
            .map(|d| d.id().to_string())
            .collect()
    }

    /// Ids of layers holding cached data, in catalog order.
    pub fn layers_with_data(&self) -> Vec<String> {
        self.catalog
            .descriptors()
            .iter()
            .filter(|d| {
                self.states
                    .get(d.id())
                    .is_some_and(|s| s.cached_data.is_some())
            })
            .map(|d| d.id().to_string())
            .collect()
    }
}
