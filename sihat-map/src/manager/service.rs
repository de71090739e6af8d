//! Layer manager implementation.

use super::options::ManagerOptions;
use super::state::ManagerState;
use crate::cache::{DatasetCache, DatasetFetcher, FailureReason};
use crate::engine::{EaseOptions, EngineHandle, MapEngine};
use crate::fetch::AsyncHttpClient;
use crate::geometry::{FeatureCollection, LngLat};
use crate::icon::IconLoader;
use crate::interaction::{InteractionBinder, PopupDetail};
use crate::layer::{LayerCatalog, LayerDescriptor, LayerRegistry, LayerRuntimeState};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a style load or reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Icons fetched and added to the engine
    pub icons_loaded: usize,
    /// Icons that could not be loaded; their layers render without a marker
    pub icons_failed: Vec<String>,
    pub layers_registered: usize,
    pub handlers_bound: usize,
    /// Default layers shown with data
    pub defaults_shown: Vec<String>,
    /// Default layers left visible but empty
    pub defaults_failed: Vec<(String, FailureReason)>,
}

/// Coordinates layer registration, data loading and interactions for one
/// map engine instance.
///
/// All operations take `&self` so several activations can be in flight at
/// once; only [`dispose`](Self::dispose) needs exclusive access. The
/// dataset cache is passed in and may outlive the manager.
///
/// # Example
///
/// ```ignore
/// let engine = Arc::new(Mutex::new(HeadlessEngine::new(DEFAULT_CENTER, DEFAULT_ZOOM)));
/// let manager = LayerManager::new(engine, client, catalog, DatasetCache::new(), options);
///
/// manager.begin_style_load()?;
/// manager.on_style_loaded().await?;
/// manager.toggle_layer("apotek", true).await?;
/// ```
pub struct LayerManager<E: MapEngine, C: AsyncHttpClient> {
    engine: Option<EngineHandle<E>>,
    catalog: Arc<LayerCatalog>,
    registry: Mutex<LayerRegistry>,
    binder: Mutex<InteractionBinder>,
    fetcher: DatasetFetcher<C>,
    icons: IconLoader<C>,
    state: Mutex<ManagerState>,
    options: ManagerOptions,
}

impl<E: MapEngine, C: AsyncHttpClient> LayerManager<E, C> {
    pub fn new(
        engine: EngineHandle<E>,
        client: Arc<C>,
        catalog: Arc<LayerCatalog>,
        cache: DatasetCache,
        options: ManagerOptions,
    ) -> Self {
        let fetcher = DatasetFetcher::new(Arc::clone(&client), cache)
            .with_base_url(options.base_url.clone());
        let icons = IconLoader::new(client).with_base_url(options.base_url.clone());

        Self {
            engine: Some(engine),
            registry: Mutex::new(LayerRegistry::new(Arc::clone(&catalog))),
            binder: Mutex::new(InteractionBinder::new(options.pointer)),
            catalog,
            fetcher,
            icons,
            state: Mutex::new(ManagerState::Uninitialized),
            options,
        }
    }

    pub fn state(&self) -> ManagerState {
        *self.state.lock()
    }

    pub fn catalog(&self) -> &Arc<LayerCatalog> {
        &self.catalog
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// The session dataset cache.
    pub fn cache(&self) -> &DatasetCache {
        self.fetcher.cache()
    }

    /// Raw engine handle, only when `expose_engine` is enabled.
    pub fn engine_handle(&self) -> Option<EngineHandle<E>> {
        if !self.options.expose_engine {
            debug!("Engine handle requested but not exposed");
            return None;
        }
        self.engine.clone()
    }

    fn set_state(&self, next: ManagerState) {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        debug!(from = %previous, to = %next, "Layer manager state changed");
    }

    fn handle(&self) -> Result<EngineHandle<E>, FailureReason> {
        self.engine.clone().ok_or(FailureReason::EngineDisposed)
    }

    /// Engine handle for a layer operation, or why there is none.
    fn layer_handle(&self) -> Result<EngineHandle<E>, FailureReason> {
        match self.state() {
            ManagerState::Disposed => Err(FailureReason::EngineDisposed),
            state if state.accepts_layer_operations() => self.handle(),
            state => {
                debug!(state = %state, "Layer operation before the style loaded");
                Err(FailureReason::EngineNotReady {
                    state: state.to_string(),
                })
            }
        }
    }

    fn transition(
        &self,
        allowed: &[ManagerState],
        next: ManagerState,
        action: &'static str,
    ) -> Result<(), FailureReason> {
        let mut state = self.state.lock();
        if *state == ManagerState::Disposed {
            return Err(FailureReason::EngineDisposed);
        }
        if !allowed.contains(&*state) {
            return Err(FailureReason::InvalidTransition {
                state: state.to_string(),
                action,
            });
        }
        let previous = std::mem::replace(&mut *state, next);
        debug!(from = %previous, to = %next, "Layer manager state changed");
        Ok(())
    }

    /// The engine started loading its style.
    pub fn begin_style_load(&self) -> Result<(), FailureReason> {
        self.transition(
            &[ManagerState::Uninitialized],
            ManagerState::Loading,
            "begin loading the style",
        )
    }

    /// The style finished loading: load icons, register every layer hidden,
    /// bind interactions and show the default layers.
    ///
    /// Failures of individual icons or default layers are reported, not
    /// returned as errors.
    pub async fn on_style_loaded(&self) -> Result<LoadReport, FailureReason> {
        self.transition(
            &[ManagerState::Uninitialized, ManagerState::Loading],
            ManagerState::Loading,
            "finish loading the style",
        )?;
        let handle = self.handle()?;

        let mut report = self.setup_style(&handle).await?;
        self.set_state(ManagerState::Ready);
        info!(
            layers = report.layers_registered,
            icons = report.icons_loaded,
            handlers = report.handlers_bound,
            "Map layers ready"
        );

        let defaults = self.options.default_layers.clone();
        let results = join_all(defaults.iter().map(|id| self.load_and_show(id, false))).await;
        for (id, result) in defaults.into_iter().zip(results) {
            match result {
                Ok(_) => report.defaults_shown.push(id),
                Err(e) => {
                    warn!(layer = %id, error = %e, "Default layer shown without data");
                    report.defaults_failed.push((id, e));
                }
            }
        }

        Ok(report)
    }

    /// The style was replaced: detach handlers, re-register layers and
    /// icons, re-bind, then restore visibility and data.
    ///
    /// On failure the manager returns to `Ready` so the next reload can
    /// retry the rebuild.
    pub async fn on_style_reload(&self) -> Result<LoadReport, FailureReason> {
        self.transition(
            &[ManagerState::Ready],
            ManagerState::Reloading,
            "reload the style",
        )?;
        let handle = self.handle()?;

        match self.rebuild_style(&handle).await {
            Ok(report) => {
                self.set_state(ManagerState::Ready);
                Ok(report)
            }
            Err(e) => {
                self.set_state(ManagerState::Ready);
                warn!(error = %e, "Style reload failed, layers left unbound until the next reload");
                Err(e)
            }
        }
    }

    async fn rebuild_style(&self, handle: &EngineHandle<E>) -> Result<LoadReport, FailureReason> {
        {
            let mut registry = self.registry.lock();
            let mut binder = self.binder.lock();
            let mut engine = handle.lock();
            binder.unbind_all(&mut *engine);
            registry.reset_for_reload();
        }

        let report = self.setup_style(handle).await?;

        let (restored, shown) = {
            let mut registry = self.registry.lock();
            let mut engine = handle.lock();
            let with_data = registry.layers_with_data();
            for id in &with_data {
                if let Some(data) = registry.state(id).and_then(|s| s.cached_data.clone()) {
                    registry.apply_data(&mut *engine, id, data)?;
                }
            }
            let visible = registry.visible_layers();
            for id in &visible {
                registry.set_visible(&mut *engine, id, true)?;
            }
            (with_data.len(), visible.len())
        };

        info!(
            restored_data = restored,
            visible = shown,
            handlers = report.handlers_bound,
            "Map layers restored after style reload"
        );
        Ok(report)
    }

    async fn setup_style(&self, handle: &EngineHandle<E>) -> Result<LoadReport, FailureReason> {
        let mut report = LoadReport::default();

        // Icons go in before the symbol layers that reference them.
        let mut seen = HashSet::new();
        for icon in self.catalog.descriptors().iter().filter_map(LayerDescriptor::icon) {
            if !seen.insert(icon.name.as_str()) {
                continue;
            }
            match self
                .icons
                .ensure_icon(handle, &icon.name, &icon.asset_url, icon.max_bitmap_dimension)
                .await
            {
                Ok(true) => report.icons_loaded += 1,
                Ok(false) => {}
                Err(_) => report.icons_failed.push(icon.name.clone()),
            }
        }

        let mut registry = self.registry.lock();
        let mut binder = self.binder.lock();
        let mut engine = handle.lock();
        for descriptor in self.catalog.descriptors() {
            registry.ensure(&mut *engine, descriptor.id())?;
            report.layers_registered += 1;

            let Some(popup) = descriptor.popup() else {
                continue;
            };
            match binder.bind_layer(&mut *engine, &descriptor.layer_id(), popup.clone().into_builder()) {
                Ok(count) => {
                    report.handlers_bound += count;
                    registry.mark_bound(descriptor.id(), true);
                }
                Err(e) => warn!(layer = descriptor.id(), error = %e, "Interaction binding skipped"),
            }
        }

        Ok(report)
    }

    /// Register a layer, show it, and load its dataset into the source.
    ///
    /// Visibility is set before the fetch starts and is not rolled back when
    /// the fetch fails. Data is applied even if the layer was hidden while
    /// the fetch was in flight. With `fit`, the camera is fitted to the
    /// data's bounds if the layer is still visible.
    pub async fn load_and_show(
        &self,
        id: &str,
        fit: bool,
    ) -> Result<Arc<FeatureCollection>, FailureReason> {
        let handle = self.layer_handle()?;
        let descriptor = self
            .catalog
            .resolve(id)
            .ok_or_else(|| FailureReason::UnknownLayer(id.to_string()))?;
        let layer = descriptor.id();

        {
            let mut registry = self.registry.lock();
            let mut engine = handle.lock();
            registry.ensure(&mut *engine, layer)?;
            registry.set_visible(&mut *engine, layer, true)?;

            let zoom = engine.zoom();
            if let Some(min_zoom) = descriptor.zoom().min.filter(|&min| zoom < min) {
                info!(
                    layer = layer,
                    zoom = zoom,
                    min_zoom = min_zoom,
                    "Layer is visible from zoom {}; zoom in to see it",
                    min_zoom
                );
            }
        }

        let data = self.fetcher.fetch(layer, descriptor.source_url()).await?;

        let still_visible = {
            let mut registry = self.registry.lock();
            let mut engine = handle.lock();
            registry.apply_data(&mut *engine, layer, Arc::clone(&data))?;
            registry.state(layer).is_some_and(|s| s.visible)
        };

        if fit {
            if still_visible {
                self.fit_to(&handle, layer, &data);
            } else {
                debug!(layer = layer, "Layer hidden during load, fit skipped");
            }
        }

        Ok(data)
    }

    fn fit_to(&self, handle: &EngineHandle<E>, layer: &str, data: &FeatureCollection) {
        match data.bounds() {
            Some(bounds) => {
                handle.lock().fit_bounds(bounds, self.options.fit);
                debug!(layer = layer, ?bounds, "Fitted view to layer");
            }
            None => debug!(layer = layer, "Nothing to fit"),
        }
    }

    /// Filter panel toggle.
    ///
    /// Panel items without a dataset are accepted and ignored.
    pub async fn toggle_layer(&self, id: &str, enabled: bool) -> Result<(), FailureReason> {
        if self.catalog.resolve(id).is_none() && self.catalog.is_panel_item(id) {
            debug!(layer = id, "Panel item has no dataset yet");
            return Ok(());
        }

        if enabled {
            self.load_and_show(id, false).await.map(|_| ())
        } else {
            self.hide_layer(id).map(|_| ())
        }
    }

    /// Hide a layer. Returns false when it is not registered.
    pub fn hide_layer(&self, id: &str) -> Result<bool, FailureReason> {
        let handle = self.layer_handle()?;
        let mut registry = self.registry.lock();
        let mut engine = handle.lock();
        Ok(registry.set_visible(&mut *engine, id, false)?)
    }

    /// Visible layer ids in catalog order.
    pub fn visible_layers(&self) -> Vec<String> {
        self.registry.lock().visible_layers()
    }

    pub fn layer_state(&self, id: &str) -> Option<LayerRuntimeState> {
        self.registry.lock().state(id).cloned()
    }

    /// Engine layer ids with interaction handlers attached.
    pub fn bound_layers(&self) -> Vec<String> {
        self.binder.lock().bound_layers()
    }

    /// Popup content for the topmost feature with a popup at `at`.
    pub fn popup_at(&self, at: LngLat, detail: PopupDetail) -> Option<String> {
        let handle = self.engine.as_ref()?;
        let hits = handle.lock().query_rendered_features(at, &[]);
        hits.iter().find_map(|hit| {
            let descriptor = self
                .catalog
                .descriptors()
                .iter()
                .find(|d| d.layer_id() == hit.layer_id)?;
            let popup = descriptor.popup()?;
            Some(popup.render(&hit.feature.properties, detail))
        })
    }

    /// Zoom in one step. Returns the target zoom.
    pub fn zoom_in(&self) -> Result<f64, FailureReason> {
        self.zoom_by(self.options.zoom_step)
    }

    /// Zoom out one step. Returns the target zoom.
    pub fn zoom_out(&self) -> Result<f64, FailureReason> {
        self.zoom_by(-self.options.zoom_step)
    }

    fn zoom_by(&self, delta: f64) -> Result<f64, FailureReason> {
        let handle = self.handle()?;
        let mut engine = handle.lock();
        let target = (engine.zoom() + delta).clamp(self.options.min_zoom, self.options.max_zoom);
        engine.ease_to(EaseOptions {
            center: None,
            zoom: Some(target),
            duration_ms: self.options.zoom_duration_ms,
        });
        Ok(target)
    }

    /// Detach every handler, drop runtime state and release the engine.
    ///
    /// The dataset cache is kept. Calling this twice is a no-op.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.engine.take() {
            let mut registry = self.registry.lock();
            let mut binder = self.binder.lock();
            let mut engine = handle.lock();
            let removed = binder.unbind_all(&mut *engine);
            registry.clear();
            self.icons.clear();
            info!(handlers = removed, "Layer manager disposed");
        }
        self.set_state(ManagerState::Disposed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        EngineError, FitOptions, HandlerId, HeadlessEngine, LayerEventHandler, LayerSpec,
        PointerEventKind, RenderedFeature,
    };
    use crate::fetch::{FetchError, MockAsyncHttpClient};
    use crate::geometry::Bounds;
    use crate::icon::{solid_png, DecodedImage};
    use serde_json::json;

    const HOSPITALS: &str = "/data/rumah_sakit.json";
    const PHARMACIES: &str = "/data/apotek.json";

    type Manager = LayerManager<HeadlessEngine, MockAsyncHttpClient>;

    fn engine() -> EngineHandle<HeadlessEngine> {
        Arc::new(Mutex::new(HeadlessEngine::new(
            LngLat::new(114.833, -3.442),
            12.0,
        )))
    }

    fn points() -> Vec<u8> {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [114.80, -3.40]},
                 "properties": {"namobj": "RSUD Banjarbaru", "wadmkc": "Banjarbaru Utara"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [114.90, -3.50]},
                 "properties": {"namobj": "RS Permata"}}
            ]
        })
        .to_string()
        .into_bytes()
    }

    fn client() -> MockAsyncHttpClient {
        MockAsyncHttpClient::new()
            .with_body("/assets/hospital.png", solid_png(256, 256, [200, 30, 30, 255]))
            .with_body(HOSPITALS, points())
            .with_body(PHARMACIES, points())
    }

    fn manager(
        engine: &EngineHandle<HeadlessEngine>,
        client: &MockAsyncHttpClient,
        options: ManagerOptions,
    ) -> Manager {
        LayerManager::new(
            Arc::clone(engine),
            Arc::new(client.clone()),
            Arc::new(LayerCatalog::banjarbaru().unwrap()),
            DatasetCache::new(),
            options,
        )
    }

    async fn ready(engine: &EngineHandle<HeadlessEngine>, client: &MockAsyncHttpClient) -> Manager {
        let manager = manager(engine, client, ManagerOptions::default());
        manager.begin_style_load().unwrap();
        manager.on_style_loaded().await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_style_load_registers_everything_and_shows_defaults() {
        let engine = engine();
        let client = client();
        let manager = manager(&engine, &client, ManagerOptions::default());

        assert_eq!(manager.state(), ManagerState::Uninitialized);
        manager.begin_style_load().unwrap();
        assert_eq!(manager.state(), ManagerState::Loading);

        let report = manager.on_style_loaded().await.unwrap();

        assert_eq!(manager.state(), ManagerState::Ready);
        assert_eq!(report.icons_loaded, 1);
        assert!(report.icons_failed.is_empty());
        assert_eq!(report.layers_registered, 8);
        assert_eq!(report.defaults_shown, vec!["hospitals"]);

        let engine = engine.lock();
        assert_eq!(engine.layer_count(), 8);
        assert_eq!(engine.source_count(), 8);
        assert!(engine.has_image("hospital-icon"));
        assert_eq!(engine.source_data("hospitals-src").unwrap().len(), 2);
        assert_eq!(manager.visible_layers(), vec!["hospitals"]);
    }

    #[tokio::test]
    async fn test_layer_operations_before_style_load_are_rejected() {
        let engine = engine();
        let client = client();
        let manager = manager(&engine, &client, ManagerOptions::default());

        let err = manager.load_and_show("apotek", false).await.unwrap_err();
        assert_eq!(
            err,
            FailureReason::EngineNotReady {
                state: "uninitialized".into()
            }
        );
        assert_eq!(engine.lock().layer_count(), 0);
        assert_eq!(client.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_begin_style_load_twice_is_invalid() {
        let engine = engine();
        let client = client();
        let manager = manager(&engine, &client, ManagerOptions::default());

        manager.begin_style_load().unwrap();
        let err = manager.begin_style_load().unwrap_err();
        assert!(matches!(err, FailureReason::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_toggle_alias_shows_and_hides() {
        let engine = engine();
        let client = client();
        let manager = ready(&engine, &client).await;

        manager.toggle_layer("apotek", true).await.unwrap();
        assert_eq!(manager.visible_layers(), vec!["hospitals", "pharmacies"]);

        manager.toggle_layer("apotek", false).await.unwrap();
        assert_eq!(manager.visible_layers(), vec!["hospitals"]);
        let state = manager.layer_state("pharmacies").unwrap();
        assert!(state.cached_data.is_some());
    }

    #[tokio::test]
    async fn test_toggle_panel_item_without_dataset_is_ignored() {
        let engine = engine();
        let client = client();
        let manager = ready(&engine, &client).await;

        manager.toggle_layer("ambulances", true).await.unwrap();
        let err = manager.toggle_layer("nope", true).await.unwrap_err();
        assert_eq!(err, FailureReason::UnknownLayer("nope".into()));
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_layer_visible_and_empty() {
        let engine = engine();
        let client = client().with_error("/data/klinik.json", FetchError::Http("HTTP 500".into()));
        let manager = ready(&engine, &client).await;

        let err = manager.load_and_show("klinik", false).await.unwrap_err();

        assert!(err.is_data_failure());
        assert!(manager.visible_layers().contains(&"clinics".to_string()));
        assert!(engine.lock().source_data("clinics-src").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zoom_hint_does_not_block_loading() {
        let engine = engine();
        engine.lock().jump_to(LngLat::new(114.8, -3.4), 5.0);
        let client = client();
        let manager = ready(&engine, &client).await;

        let data = manager.load_and_show("apotek", false).await.unwrap();
        assert_eq!(data.len(), 2);
    }

    #[tokio::test]
    async fn test_load_and_show_fits_bounds() {
        let engine = engine();
        let client = client();
        let manager = ready(&engine, &client).await;

        manager.load_and_show("pharmacies", true).await.unwrap();

        let fit = engine.lock().last_fit().unwrap();
        assert_eq!(fit.bounds.min_x, 114.80);
        assert_eq!(fit.bounds.max_x, 114.90);
        assert_eq!(fit.bounds.min_y, -3.50);
        assert_eq!(fit.bounds.max_y, -3.40);
        assert_eq!(fit.options.padding, 40);
    }

    #[tokio::test]
    async fn test_popup_at_renders_topmost_feature() {
        let engine = engine();
        let client = client();
        let manager = ready(&engine, &client).await;

        let html = manager
            .popup_at(LngLat::new(114.80, -3.40), PopupDetail::Full)
            .unwrap();
        assert!(html.contains("RSUD Banjarbaru"));
        assert!(html.contains("<b>Kecamatan</b> Banjarbaru Utara"));
        assert!(manager
            .popup_at(LngLat::new(100.0, 0.0), PopupDetail::Full)
            .is_none());
    }

    #[tokio::test]
    async fn test_zoom_buttons_step_and_clamp() {
        let engine = engine();
        let client = client();
        let manager = ready(&engine, &client).await;

        assert_eq!(manager.zoom_in().unwrap(), 12.5);
        assert_eq!(engine.lock().last_ease().unwrap().duration_ms, 300);

        engine.lock().jump_to(LngLat::new(114.8, -3.4), 17.8);
        assert_eq!(manager.zoom_in().unwrap(), 18.0);

        engine.lock().jump_to(LngLat::new(114.8, -3.4), 3.2);
        assert_eq!(manager.zoom_out().unwrap(), 3.0);
    }

    #[tokio::test]
    async fn test_engine_handle_requires_debug_flag() {
        let engine = engine();
        let client = client();
        assert!(manager(&engine, &client, ManagerOptions::default())
            .engine_handle()
            .is_none());

        let options = ManagerOptions {
            expose_engine: true,
            ..ManagerOptions::default()
        };
        assert!(manager(&engine, &client, options).engine_handle().is_some());
    }

    #[tokio::test]
    async fn test_reload_rebinds_without_duplicates() {
        let engine = engine();
        let client = client();
        let manager = ready(&engine, &client).await;
        manager.load_and_show("apotek", false).await.unwrap();
        let handlers = engine.lock().handler_count();

        for _ in 0..3 {
            engine.lock().reload_style();
            manager.on_style_reload().await.unwrap();
        }

        let engine = engine.lock();
        assert_eq!(manager.state(), ManagerState::Ready);
        assert_eq!(engine.handler_count(), handlers);
        assert_eq!(engine.layer_count(), 8);
        assert!(engine.has_image("hospital-icon"));
        assert_eq!(engine.source_data("pharmacies-src").unwrap().len(), 2);
        assert_eq!(manager.visible_layers(), vec!["hospitals", "pharmacies"]);
        // Datasets and icons come from memory on reload.
        assert_eq!(client.calls(PHARMACIES), 1);
        assert_eq!(client.calls("/assets/hospital.png"), 1);
    }

    /// Headless engine whose `add_layer` can be switched to fail.
    struct FlakyStyleEngine {
        inner: HeadlessEngine,
        reject_layers: bool,
    }

    impl MapEngine for FlakyStyleEngine {
        fn add_source(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<(), EngineError> {
            self.inner.add_source(id, data)
        }
        fn has_source(&self, id: &str) -> bool {
            self.inner.has_source(id)
        }
        fn source_data(&self, id: &str) -> Option<Arc<FeatureCollection>> {
            self.inner.source_data(id)
        }
        fn set_data(&mut self, id: &str, data: Arc<FeatureCollection>) -> Result<(), EngineError> {
            self.inner.set_data(id, data)
        }
        fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError> {
            if self.reject_layers {
                return Err(EngineError::DuplicateLayer(spec.id));
            }
            self.inner.add_layer(spec)
        }
        fn has_layer(&self, id: &str) -> bool {
            self.inner.has_layer(id)
        }
        fn set_layout_property(
            &mut self,
            layer_id: &str,
            name: &str,
            value: serde_json::Value,
        ) -> Result<(), EngineError> {
            self.inner.set_layout_property(layer_id, name, value)
        }
        fn add_image(&mut self, name: &str, image: DecodedImage) -> Result<(), EngineError> {
            self.inner.add_image(name, image)
        }
        fn has_image(&self, name: &str) -> bool {
            self.inner.has_image(name)
        }
        fn on(
            &mut self,
            event: PointerEventKind,
            layer_id: &str,
            handler: LayerEventHandler,
        ) -> HandlerId {
            self.inner.on(event, layer_id, handler)
        }
        fn off(&mut self, handler: HandlerId) -> bool {
            self.inner.off(handler)
        }
        fn query_rendered_features(&self, at: LngLat, layer_ids: &[String]) -> Vec<RenderedFeature> {
            self.inner.query_rendered_features(at, layer_ids)
        }
        fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions) {
            self.inner.fit_bounds(bounds, options)
        }
        fn ease_to(&mut self, options: EaseOptions) {
            self.inner.ease_to(options)
        }
        fn zoom(&self) -> f64 {
            self.inner.zoom()
        }
        fn clear_popups(&mut self) {
            self.inner.clear_popups()
        }
    }

    #[tokio::test]
    async fn test_failed_reload_returns_to_ready_and_can_retry() {
        let engine = Arc::new(Mutex::new(FlakyStyleEngine {
            inner: HeadlessEngine::new(LngLat::new(114.833, -3.442), 12.0),
            reject_layers: false,
        }));
        let client = client();
        let manager = LayerManager::new(
            Arc::clone(&engine),
            Arc::new(client.clone()),
            Arc::new(LayerCatalog::banjarbaru().unwrap()),
            DatasetCache::new(),
            ManagerOptions::default(),
        );
        manager.begin_style_load().unwrap();
        manager.on_style_loaded().await.unwrap();

        {
            let mut engine = engine.lock();
            engine.inner.reload_style();
            engine.reject_layers = true;
        }
        assert!(manager.on_style_reload().await.is_err());
        assert_eq!(manager.state(), ManagerState::Ready);

        {
            let mut engine = engine.lock();
            engine.inner.reload_style();
            engine.reject_layers = false;
        }
        manager.on_style_reload().await.unwrap();
        assert_eq!(manager.state(), ManagerState::Ready);
        assert_eq!(engine.lock().inner.layer_count(), 8);
        assert_eq!(manager.visible_layers(), vec!["hospitals"]);
    }

    #[tokio::test]
    async fn test_dispose_releases_engine_and_keeps_cache() {
        let engine = engine();
        let client = client();
        let mut manager = ready(&engine, &client).await;
        let cache = manager.cache().clone();

        manager.dispose();

        assert_eq!(manager.state(), ManagerState::Disposed);
        assert_eq!(engine.lock().handler_count(), 0);
        assert!(manager.visible_layers().is_empty());
        assert_eq!(
            manager.load_and_show("apotek", false).await.unwrap_err(),
            FailureReason::EngineDisposed
        );
        assert!(cache.contains(HOSPITALS));

        manager.dispose();
        assert_eq!(manager.state(), ManagerState::Disposed);
    }
}
