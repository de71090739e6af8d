//! Session-lifetime dataset cache and fetcher.
//!
//! Datasets are keyed by URL, not by layer, so two layers sharing a dataset
//! share one fetch. Entries are never evicted: dataset volume is bounded and
//! small. The cache is independent of the map engine and may outlive it.
//!
//! ```text
//! load_and_show ──► DatasetFetcher ──► DatasetCache (hit) ──► Arc<FeatureCollection>
//!                        │
//!                        └─(miss)─► AsyncHttpClient ─► JSON ─► normalize ─► insert
//! ```

mod dataset;
mod fetcher;
mod types;

pub use dataset::{CacheStats, DatasetCache};
pub use fetcher::DatasetFetcher;
pub use types::FailureReason;
