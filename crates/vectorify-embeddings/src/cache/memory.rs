//! L1 in-memory cache tier using moka.
//!
//! TinyLFU admission, capacity-bounded. Keys are `"{namespace}/{key-hex}"`
//! so one moka instance serves every namespace.

use moka::sync::Cache;
use vectorify_core::CacheKey;

/// In-memory vector cache in front of the disk store.
#[derive(Debug)]
pub struct MemoryTier {
    cache: Cache<String, Vec<f32>>,
}

impl MemoryTier {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).build();
        Self { cache }
    }

    fn compose(namespace: &str, key: &CacheKey) -> String {
        format!("{namespace}/{key}")
    }

    pub fn get(&self, namespace: &str, key: &CacheKey) -> Option<Vec<f32>> {
        self.cache.get(&Self::compose(namespace, key))
    }

    pub fn insert(&self, namespace: &str, key: &CacheKey, vector: Vec<f32>) {
        self.cache.insert(Self::compose(namespace, key), vector);
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything. Invalidation is coarse (whole tier) — the disk
    /// store remains the source of truth, so over-invalidating only costs
    /// a re-read.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
