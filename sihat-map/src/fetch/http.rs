//! HTTP client abstraction for testability

use super::types::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default User-Agent sent with dataset and icon requests.
pub const DEFAULT_USER_AGENT: &str = concat!("sihat-map/", env!("CARGO_PKG_VERSION"));

/// Trait for asynchronous HTTP GET.
///
/// Both dataset JSON and raster icons are fetched through this trait. There
/// is no authentication and no pagination: one GET returns the whole body.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body as bytes, or an error for transport failures and
    /// non-success status codes.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with a 30 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(30, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom timeout and User-Agent.
    pub fn with_settings(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(FetchError::Http(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => Err(FetchError::Http(format!(
                "Failed to read response: {}",
                e
            ))),
        }
    }
}

/// Resolve a dataset or asset location against the site base URL.
///
/// Absolute `http(s)://` URLs are returned unchanged. Site-relative paths
/// such as `/data/puskesmas.json` are joined to `base` when one is set.
pub fn resolve_url(base: Option<&str>, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match base {
        Some(base) if !base.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        _ => url.to_string(),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    /// Mock async HTTP client serving canned bodies per URL.
    ///
    /// Counts requests per URL. When gated, every request waits for a permit
    /// added with [`MockAsyncHttpClient::release`].
    #[derive(Clone, Default)]
    pub struct MockAsyncHttpClient {
        responses: Arc<Mutex<HashMap<String, Result<Vec<u8>, FetchError>>>>,
        calls: Arc<Mutex<HashMap<String, usize>>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl MockAsyncHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Requests block until released.
        pub fn gated() -> Self {
            Self {
                gate: Some(Arc::new(Semaphore::new(0))),
                ..Self::default()
            }
        }

        pub fn with_body(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.responses
                .lock()
                .insert(url.to_string(), Ok(body.into()));
            self
        }

        pub fn with_error(self, url: &str, error: FetchError) -> Self {
            self.responses.lock().insert(url.to_string(), Err(error));
            self
        }

        /// Let `n` pending or future requests complete.
        pub fn release(&self, n: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(n);
            }
        }

        pub fn calls(&self, url: &str) -> usize {
            self.calls.lock().get(url).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().values().sum()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            self.responses
                .lock()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Http(format!("HTTP 404 from {}", url))))
        }
    }

    #[test]
    fn test_resolve_relative_path_against_base() {
        assert_eq!(
            resolve_url(Some("https://sihat.banjarbarukota.go.id/"), "/data/apotek.json"),
            "https://sihat.banjarbarukota.go.id/data/apotek.json"
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_url() {
        assert_eq!(
            resolve_url(Some("https://a.example"), "https://b.example/x.json"),
            "https://b.example/x.json"
        );
    }

    #[test]
    fn test_resolve_without_base() {
        assert_eq!(resolve_url(None, "/data/klinik.json"), "/data/klinik.json");
        assert_eq!(resolve_url(Some(""), "/data/klinik.json"), "/data/klinik.json");
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = MockAsyncHttpClient::new().with_body("a", b"{}".to_vec());
        assert!(mock.get("a").await.is_ok());
        assert!(mock.get("a").await.is_ok());
        assert!(mock.get("b").await.is_err());
        assert_eq!(mock.calls("a"), 2);
        assert_eq!(mock.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_gated_mock_waits_for_release() {
        let mock = MockAsyncHttpClient::gated().with_body("a", b"1".to_vec());
        mock.release(1);
        assert_eq!(mock.get("a").await.unwrap(), b"1".to_vec());
    }
}
