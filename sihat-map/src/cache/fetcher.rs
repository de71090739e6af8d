//! Fetch, parse and normalize datasets through the cache.

use super::dataset::DatasetCache;
use super::types::FailureReason;
use crate::fetch::{resolve_url, AsyncHttpClient};
use crate::geometry::{normalize, FeatureCollection};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads datasets at most once per URL per session.
///
/// In-flight fetches are not de-duplicated: two activations racing on the
/// same URL may both fetch, and the later insert overwrites the earlier one
/// with equal data.
pub struct DatasetFetcher<C: AsyncHttpClient> {
    client: Arc<C>,
    cache: DatasetCache,
    base_url: Option<String>,
}

impl<C: AsyncHttpClient> DatasetFetcher<C> {
    /// Creates a fetcher over an existing cache.
    pub fn new(client: Arc<C>, cache: DatasetCache) -> Self {
        Self {
            client,
            cache,
            base_url: None,
        }
    }

    /// Resolve site-relative URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Return the cached dataset for `url`, fetching it on a miss.
    ///
    /// `layer_id` is only used for diagnostics.
    pub async fn fetch(
        &self,
        layer_id: &str,
        url: &str,
    ) -> Result<Arc<FeatureCollection>, FailureReason> {
        if let Some(cached) = self.cache.get(url) {
            debug!(layer = layer_id, url = url, "Dataset served from cache");
            return Ok(cached);
        }

        let resolved = resolve_url(self.base_url.as_deref(), url);
        let body = self.client.get(&resolved).await.map_err(|e| {
            warn!(layer = layer_id, url = %resolved, error = %e, "Dataset fetch failed");
            FailureReason::Network {
                url: resolved.clone(),
                message: e.to_string(),
            }
        })?;

        let raw: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            warn!(layer = layer_id, url = %resolved, error = %e, "Dataset is not valid JSON");
            FailureReason::Parse {
                url: resolved.clone(),
                message: e.to_string(),
            }
        })?;

        let collection = normalize(&raw);
        info!(
            layer = layer_id,
            features = collection.len(),
            "Dataset converted"
        );
        if let Some(first) = collection.features.first() {
            debug!(
                layer = layer_id,
                properties = %serde_json::Value::Object(first.properties.clone()),
                geometry = first.geometry.as_ref().map(|g| g.type_name()).unwrap_or("none"),
                "Sample feature"
            );
        }

        Ok(self.cache.insert(url, collection))
    }
}
