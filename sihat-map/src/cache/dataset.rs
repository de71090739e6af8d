//! URL-keyed feature collection cache.

use crate::geometry::FeatureCollection;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Snapshot of cache counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Stores, including overwrites by racing fetches
    pub inserts: u64,
    /// Distinct URLs currently cached
    pub entries: usize,
}

impl CacheStats {
    /// Returns the hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: DashMap<String, Arc<FeatureCollection>>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

/// Normalized datasets keyed by source URL.
///
/// Cloning is cheap and shares the entries, which is how a recreated manager
/// keeps the network-level cache across an engine teardown.
#[derive(Clone, Default)]
pub struct DatasetCache {
    inner: Arc<Inner>,
}

impl DatasetCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a dataset, counting the hit or miss.
    pub fn get(&self, url: &str) -> Option<Arc<FeatureCollection>> {
        match self.inner.entries.get(url) {
            Some(entry) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a dataset. A later store for the same URL replaces the entry.
    pub fn insert(&self, url: &str, data: FeatureCollection) -> Arc<FeatureCollection> {
        let data = Arc::new(data);
        self.inner
            .entries
            .insert(url.to_string(), Arc::clone(&data));
        self.inner.inserts.fetch_add(1, Ordering::Relaxed);
        data
    }

    /// Whether the URL is cached. Does not touch the counters.
    pub fn contains(&self, url: &str) -> bool {
        self.inner.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Cached URLs, sorted.
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .inner
            .entries
            .iter()
            .map(|e| e.key().clone())
            .collect();
        urls.sort();
        urls
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            inserts: self.inner.inserts.load(Ordering::Relaxed),
            entries: self.inner.entries.len(),
        }
    }
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Feature, Geometry};

    fn single_point() -> FeatureCollection {
        FeatureCollection::new(vec![Feature::from_geometry(Geometry::Point {
            coordinates: vec![114.8, -3.4],
        })])
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let cache = DatasetCache::new();
        assert!(cache.get("/data/apotek.json").is_none());
        cache.insert("/data/apotek.json", single_point());
        assert!(cache.get("/data/apotek.json").is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_ratio(), 0.5);
    }

    #[test]
    fn test_clone_shares_entries() {
        let cache = DatasetCache::new();
        let retained = cache.clone();
        cache.insert("a", single_point());
        assert!(retained.contains("a"));
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn test_insert_overwrites_same_url() {
        let cache = DatasetCache::new();
        cache.insert("a", FeatureCollection::empty());
        cache.insert("a", single_point());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().len(), 1);
        assert_eq!(cache.stats().inserts, 2);
    }

    #[test]
    fn test_urls_sorted() {
        let cache = DatasetCache::new();
        cache.insert("b", FeatureCollection::empty());
        cache.insert("a", FeatureCollection::empty());
        assert_eq!(cache.urls(), vec!["a".to_string(), "b".to_string()]);
    }
}
