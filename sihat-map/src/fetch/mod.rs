//! Dataset and icon retrieval over HTTP.
//!
//! The [`AsyncHttpClient`] trait is the only network seam of the crate; the
//! data fetcher and the icon loader are generic over it so tests can inject
//! counting or gated clients.

mod http;
mod types;

pub use http::{resolve_url, AsyncHttpClient, AsyncReqwestClient, DEFAULT_USER_AGENT};
pub use types::FetchError;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
