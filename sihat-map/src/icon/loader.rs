//! Fetch and register icons with a map engine.

use super::decode::{BitmapDecoder, CanvasBitmapDecoder, FastBitmapDecoder};
use super::types::{DecodedImage, IconError};
use crate::engine::{EngineHandle, MapEngine};
use crate::fetch::{resolve_url, AsyncHttpClient};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads raster icons over HTTP.
///
/// Decoded bitmaps are kept per icon name for the lifetime of the loader, so
/// a style reload re-adds them to the engine without another fetch.
pub struct IconLoader<C: AsyncHttpClient> {
    client: Arc<C>,
    fast: Option<Box<dyn BitmapDecoder>>,
    fallback: Box<dyn BitmapDecoder>,
    base_url: Option<String>,
    decoded: Mutex<HashMap<String, DecodedImage>>,
}

impl<C: AsyncHttpClient> IconLoader<C> {
    /// Creates a loader with the fast decoder and the canvas fallback.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            fast: Some(Box::new(FastBitmapDecoder)),
            fallback: Box::new(CanvasBitmapDecoder),
            base_url: None,
            decoded: Mutex::new(HashMap::new()),
        }
    }

    /// Disable the fast path, forcing every decode through the fallback.
    pub fn without_fast_path(mut self) -> Self {
        self.fast = None;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Fetch and decode an icon, fitting it within `max_dimension`.
    pub async fn load_icon(&self, url: &str, max_dimension: u32) -> Result<DecodedImage, IconError> {
        let resolved = resolve_url(self.base_url.as_deref(), url);
        let bytes = self
            .client
            .get(&resolved)
            .await
            .map_err(|e| IconError::Fetch {
                url: resolved.clone(),
                message: e.to_string(),
            })?;

        self.decode(&bytes, max_dimension)
    }

    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<DecodedImage, IconError> {
        if let Some(fast) = &self.fast {
            match fast.decode(bytes, max_dimension) {
                Err(IconError::Unsupported(reason)) => {
                    debug!(
                        decoder = fast.name(),
                        reason = %reason,
                        "Fast decode unavailable, using fallback"
                    );
                }
                result => return result,
            }
        }
        self.fallback.decode(bytes, max_dimension)
    }

    /// Make sure the engine has an image called `name`.
    ///
    /// Returns `Ok(false)` without fetching when the image is already
    /// present, `Ok(true)` when it was added now. A name decoded earlier is
    /// re-added from memory; only a name never seen before is fetched.
    /// Failures are logged and returned; the caller is expected to carry on
    /// without the icon.
    pub async fn ensure_icon<E: MapEngine>(
        &self,
        engine: &EngineHandle<E>,
        name: &str,
        url: &str,
        max_dimension: u32,
    ) -> Result<bool, IconError> {
        if engine.lock().has_image(name) {
            debug!(icon = name, "Icon already loaded");
            return Ok(false);
        }

        let remembered = self.decoded.lock().get(name).cloned();
        let image = match remembered {
            Some(image) => {
                debug!(icon = name, "Icon restored without fetching");
                image
            }
            None => match self.load_icon(url, max_dimension).await {
                Ok(image) => {
                    self.decoded.lock().insert(name.to_string(), image.clone());
                    image
                }
                Err(e) => {
                    warn!(icon = name, url = url, error = %e, "Failed to load icon");
                    return Err(e);
                }
            },
        };

        let (width, height) = (image.width, image.height);
        let mut engine = engine.lock();
        // Another activation may have won the race while we were fetching.
        if engine.has_image(name) {
            return Ok(false);
        }
        engine.add_image(name, image).map_err(|e| {
            warn!(icon = name, error = %e, "Engine rejected icon");
            IconError::from(e)
        })?;
        info!(icon = name, width = width, height = height, "Icon loaded");
        Ok(true)
    }

    /// Whether a decoded bitmap is held for `name`.
    pub fn is_cached(&self, name: &str) -> bool {
        self.decoded.lock().contains_key(name)
    }

    /// Forget every decoded bitmap. Used when the engine goes away.
    pub fn clear(&self) {
        self.decoded.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeadlessEngine;
    use crate::fetch::{FetchError, MockAsyncHttpClient};
    use crate::geometry::LngLat;
    use crate::icon::decode::tests::solid_png;

    fn engine() -> EngineHandle<HeadlessEngine> {
        Arc::new(Mutex::new(HeadlessEngine::new(LngLat::new(0.0, 0.0), 10.0)))
    }

    #[tokio::test]
    async fn test_load_icon_downsamples() {
        let client = MockAsyncHttpClient::new().with_body("/assets/h.png", solid_png(256, 128, [1, 2, 3, 255]));
        let loader = IconLoader::new(Arc::new(client));

        let image = loader.load_icon("/assets/h.png", 64).await.unwrap();
        assert_eq!((image.width, image.height), (64, 32));
    }

    #[tokio::test]
    async fn test_fallback_path_used_without_fast_decoder() {
        let client = MockAsyncHttpClient::new().with_body("/assets/h.png", solid_png(32, 32, [1, 2, 3, 255]));
        let loader = IconLoader::new(Arc::new(client)).without_fast_path();

        let image = loader.load_icon("/assets/h.png", 16).await.unwrap();
        assert_eq!((image.width, image.height), (16, 16));
    }

    #[tokio::test]
    async fn test_ensure_icon_never_reloads() {
        let client = Arc::new(
            MockAsyncHttpClient::new().with_body("/assets/h.png", solid_png(8, 8, [0, 0, 0, 255])),
        );
        let loader = IconLoader::new(Arc::clone(&client));
        let engine = engine();

        assert!(loader.ensure_icon(&engine, "hospital-icon", "/assets/h.png", 64).await.unwrap());
        assert!(!loader.ensure_icon(&engine, "hospital-icon", "/assets/h.png", 64).await.unwrap());

        assert_eq!(client.calls("/assets/h.png"), 1);
        assert_eq!(engine.lock().counters().images_added, 1);
    }

    #[tokio::test]
    async fn test_ensure_icon_restores_after_style_reload_without_fetching() {
        let client = Arc::new(
            MockAsyncHttpClient::new().with_body("/assets/h.png", solid_png(8, 8, [0, 0, 0, 255])),
        );
        let loader = IconLoader::new(Arc::clone(&client));
        let engine = engine();

        assert!(loader.ensure_icon(&engine, "hospital-icon", "/assets/h.png", 64).await.unwrap());
        for _ in 0..3 {
            engine.lock().reload_style();
            assert!(loader.ensure_icon(&engine, "hospital-icon", "/assets/h.png", 64).await.unwrap());
        }

        assert_eq!(client.calls("/assets/h.png"), 1);
        assert!(engine.lock().has_image("hospital-icon"));
        assert_eq!(engine.lock().counters().images_added, 4);

        loader.clear();
        assert!(!loader.is_cached("hospital-icon"));
    }

    #[tokio::test]
    async fn test_ensure_icon_reports_fetch_failure() {
        let client = MockAsyncHttpClient::new()
            .with_error("/assets/h.png", FetchError::Http("HTTP 404".into()));
        let loader = IconLoader::new(Arc::new(client));
        let engine = engine();

        let err = loader
            .ensure_icon(&engine, "hospital-icon", "/assets/h.png", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, IconError::Fetch { .. }));
        assert!(!engine.lock().has_image("hospital-icon"));
    }

    #[tokio::test]
    async fn test_undecodable_bytes_fail_both_paths() {
        let client = MockAsyncHttpClient::new().with_body("/assets/h.png", b"garbage".to_vec());
        let loader = IconLoader::new(Arc::new(client));

        let err = loader.load_icon("/assets/h.png", 64).await.unwrap_err();
        assert!(matches!(err, IconError::Decode(_)));
    }
}
