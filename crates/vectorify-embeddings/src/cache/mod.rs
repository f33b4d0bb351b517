//! Two-tier content-addressable vector cache.
//!
//! [`VectorCache`] coordinates a moka-backed memory tier and the persistent
//! [`DiskStore`]. Reads check memory first and promote disk hits; writes go
//! through to both tiers. One logical namespace per embedder identity.

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryTier;

use std::path::Path;

use tracing::debug;
use vectorify_core::models::{CacheEntryMeta, CacheStats};
use vectorify_core::{CacheKey, VectorifyResult};

/// Which tier served a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitTier {
    Memory,
    Disk,
}

/// The shared vector cache handle: opened once at pipeline construction and
/// passed in explicitly — there is no process-wide cache directory.
#[derive(Debug)]
pub struct VectorCache {
    memory: MemoryTier,
    disk: DiskStore,
}

impl VectorCache {
    /// Open a cache rooted at `root`, with an L1 capacity of
    /// `memory_capacity` entries.
    pub fn open(root: impl AsRef<Path>, memory_capacity: u64) -> VectorifyResult<Self> {
        Ok(Self {
            memory: MemoryTier::new(memory_capacity),
            disk: DiskStore::open(root)?,
        })
    }

    /// Open with the default L1 capacity.
    pub fn open_default(root: impl AsRef<Path>) -> VectorifyResult<Self> {
        Self::open(root, vectorify_core::config::defaults::DEFAULT_L1_CAPACITY)
    }

    /// Look up a vector. `Ok(None)` is a miss; `Err` is a storage failure
    /// for this key, distinct from a miss by contract.
    pub fn get(
        &self,
        namespace: &str,
        key: &CacheKey,
    ) -> VectorifyResult<Option<(Vec<f32>, CacheHitTier)>> {
        if let Some(vector) = self.memory.get(namespace, key) {
            return Ok(Some((vector, CacheHitTier::Memory)));
        }
        match self.disk.get(namespace, key)? {
            Some(vector) => {
                // Promote so the next read skips disk.
                self.memory.insert(namespace, key, vector.clone());
                debug!(namespace, key = %key, "disk hit promoted to memory tier");
                Ok(Some((vector, CacheHitTier::Disk)))
            }
            None => Ok(None),
        }
    }

    /// Write-through put into both tiers. Inherits the disk store's
    /// idempotence and version-skew semantics.
    pub fn put(&self, namespace: &str, key: &CacheKey, vector: &[f32]) -> VectorifyResult<()> {
        self.disk.put(namespace, key, vector)?;
        self.memory.insert(namespace, key, vector.to_vec());
        Ok(())
    }

    pub fn stats(&self) -> VectorifyResult<CacheStats> {
        self.disk.stats()
    }

    /// Lazy enumeration of one namespace's entries (key + metadata, no
    /// vectors). Restartable by calling again.
    pub fn list_entries(
        &self,
        namespace: &str,
    ) -> VectorifyResult<impl Iterator<Item = VectorifyResult<(CacheKey, CacheEntryMeta)>>> {
        self.disk.list_entries(namespace)
    }

    /// Remove one namespace from disk and drop the memory tier.
    pub fn clear(&self, namespace: &str) -> VectorifyResult<()> {
        self.disk.clear(namespace)?;
        self.memory.clear();
        Ok(())
    }

    /// Remove every namespace. Irreversible.
    pub fn clear_all(&self) -> VectorifyResult<()> {
        self.disk.clear_all()?;
        self.memory.clear();
        Ok(())
    }
}
