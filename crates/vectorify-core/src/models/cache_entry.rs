use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one persisted cache entry. Lives in the namespace manifest
/// so stats and listings never have to read vector files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntryMeta {
    /// Vector dimensionality.
    pub dimensions: usize,
    /// Size of the entry file in bytes (`dimensions * 4`).
    pub bytes: u64,
    /// When the entry was first written.
    pub created_at: DateTime<Utc>,
}

/// Aggregate statistics for the whole cache store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub namespaces: Vec<String>,
}
