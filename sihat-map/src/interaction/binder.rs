//! Attach and detach popup handlers.

use super::popup::{ContentBuilder, PopupDetail};
use crate::engine::{
    HandlerId, MapEngine, PointerEvent, PointerEventKind, PopupCommand, PopupKind, PopupSpec,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors from binding interactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The layer already has handlers; call `unbind_all` first
    #[error("layer {0} is already bound")]
    AlreadyBound(String),
}

/// Primary pointer of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    /// Mouse or trackpad: hover popups enabled
    #[default]
    Fine,
    /// Touch: click popups only
    Coarse,
}

/// Tracks the handlers registered per layer.
///
/// Holds handler ids only, never the engine. Every re-bind path must go
/// through [`InteractionBinder::unbind_all`]; binding a layer twice is an
/// error rather than a silent duplicate.
#[derive(Debug, Default)]
pub struct InteractionBinder {
    pointer: PointerKind,
    bindings: BTreeMap<String, Vec<HandlerId>>,
}

impl InteractionBinder {
    pub fn new(pointer: PointerKind) -> Self {
        Self {
            pointer,
            bindings: BTreeMap::new(),
        }
    }

    pub fn pointer(&self) -> PointerKind {
        self.pointer
    }

    /// Register hover and click handlers for `layer_id`.
    ///
    /// Returns the number of handlers attached.
    pub fn bind_layer<E: MapEngine>(
        &mut self,
        engine: &mut E,
        layer_id: &str,
        builder: ContentBuilder,
    ) -> Result<usize, BindError> {
        if self.bindings.contains_key(layer_id) {
            return Err(BindError::AlreadyBound(layer_id.to_string()));
        }

        let mut handles = Vec::with_capacity(3);

        if self.pointer == PointerKind::Fine {
            let hover = builder.clone();
            handles.push(engine.on(
                PointerEventKind::MouseMove,
                layer_id,
                Box::new(move |event: &PointerEvent| {
                    show(event, PopupKind::Hover, &hover, PopupDetail::Summary)
                }),
            ));
            handles.push(engine.on(
                PointerEventKind::MouseLeave,
                layer_id,
                Box::new(|_: &PointerEvent| vec![PopupCommand::Close(PopupKind::Hover)]),
            ));
        }

        handles.push(engine.on(
            PointerEventKind::Click,
            layer_id,
            Box::new(move |event: &PointerEvent| {
                let mut commands = vec![PopupCommand::Close(PopupKind::Hover)];
                commands.extend(show(event, PopupKind::Pinned, &builder, PopupDetail::Full));
                commands
            }),
        ));

        let count = handles.len();
        debug!(layer = layer_id, handlers = count, "Interactions bound");
        self.bindings.insert(layer_id.to_string(), handles);
        Ok(count)
    }

    /// Detach every handler and close open popups.
    ///
    /// Returns the number of handlers removed.
    pub fn unbind_all<E: MapEngine>(&mut self, engine: &mut E) -> usize {
        let mut removed = 0;
        for (_, handles) in std::mem::take(&mut self.bindings) {
            for handle in handles {
                if engine.off(handle) {
                    removed += 1;
                }
            }
        }
        engine.clear_popups();
        debug!(handlers = removed, "Interactions unbound");
        removed
    }

    pub fn is_bound(&self, layer_id: &str) -> bool {
        self.bindings.contains_key(layer_id)
    }

    /// Bound layer ids, sorted.
    pub fn bound_layers(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

fn show(
    event: &PointerEvent,
    kind: PopupKind,
    builder: &ContentBuilder,
    detail: PopupDetail,
) -> Vec<PopupCommand> {
    let Some(feature) = event.features.first() else {
        return Vec::new();
    };
    vec![PopupCommand::Show(PopupSpec {
        kind,
        lng_lat: event.lng_lat,
        html: builder(&feature.properties, detail),
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{HeadlessEngine, LayerSpec, RenderMode, Visibility};
    use crate::geometry::{Feature, FeatureCollection, Geometry, LngLat, Properties};
    use crate::interaction::{PopupField, PopupTemplate};
    use serde_json::{json, Map};
    use std::sync::Arc;

    const AT: LngLat = LngLat {
        lng: 114.8,
        lat: -3.4,
    };

    fn engine_with_layer() -> HeadlessEngine {
        let mut engine = HeadlessEngine::new(AT, 12.0);
        let mut properties = Properties::new();
        properties.insert("namobj".into(), json!("Puskesmas <Cempaka>"));
        properties.insert("wadmkc".into(), json!("Cempaka"));
        let feature = Feature::from_geometry(Geometry::Point {
            coordinates: vec![AT.lng, AT.lat],
        })
        .with_properties(properties);
        engine
            .add_source("p-src", Arc::new(FeatureCollection::new(vec![feature])))
            .unwrap();
        let mut layout = Map::new();
        layout.insert("visibility".into(), Visibility::Visible.to_value());
        engine
            .add_layer(LayerSpec {
                id: "p-layer".into(),
                source: "p-src".into(),
                render_mode: RenderMode::Circle,
                min_zoom: None,
                max_zoom: None,
                layout,
                paint: Map::new(),
            })
            .unwrap();
        engine
    }

    fn builder() -> ContentBuilder {
        PopupTemplate::new(&["namobj"])
            .field(PopupField::text("Kecamatan", "wadmkc"))
            .into_builder()
    }

    #[test]
    fn test_fine_pointer_binds_hover_and_click() {
        let mut engine = engine_with_layer();
        let mut binder = InteractionBinder::new(PointerKind::Fine);

        assert_eq!(binder.bind_layer(&mut engine, "p-layer", builder()).unwrap(), 3);

        engine.pointer_move(AT);
        let hover = engine.hover_popup().unwrap();
        assert!(hover.html.contains("Puskesmas &lt;Cempaka&gt;"));
        assert!(!hover.html.contains("Kecamatan"));

        engine.click(AT);
        assert!(engine.hover_popup().is_none());
        let pinned = engine.pinned_popup().unwrap();
        assert!(pinned.html.contains("<b>Kecamatan</b> Cempaka"));
        assert!(pinned.close_button());
    }

    #[test]
    fn test_coarse_pointer_suppresses_hover() {
        let mut engine = engine_with_layer();
        let mut binder = InteractionBinder::new(PointerKind::Coarse);

        assert_eq!(binder.bind_layer(&mut engine, "p-layer", builder()).unwrap(), 1);
        engine.pointer_move(AT);
        assert!(engine.hover_popup().is_none());
        assert_eq!(engine.click(AT), 1);
        assert!(engine.pinned_popup().is_some());
    }

    #[test]
    fn test_double_bind_is_rejected() {
        let mut engine = engine_with_layer();
        let mut binder = InteractionBinder::default();
        binder.bind_layer(&mut engine, "p-layer", builder()).unwrap();

        assert_eq!(
            binder.bind_layer(&mut engine, "p-layer", builder()),
            Err(BindError::AlreadyBound("p-layer".into()))
        );
        assert_eq!(engine.handlers_for(PointerEventKind::Click, "p-layer"), 1);
    }

    #[test]
    fn test_unbind_all_removes_handlers_and_popups() {
        let mut engine = engine_with_layer();
        let mut binder = InteractionBinder::default();
        binder.bind_layer(&mut engine, "p-layer", builder()).unwrap();
        engine.click(AT);

        assert_eq!(binder.unbind_all(&mut engine), 3);
        assert_eq!(engine.handler_count(), 0);
        assert!(engine.pinned_popup().is_none());
        assert!(binder.bound_layers().is_empty());

        // Rebinding after teardown is allowed.
        binder.bind_layer(&mut engine, "p-layer", builder()).unwrap();
        assert_eq!(engine.handler_count(), 3);
    }
}
