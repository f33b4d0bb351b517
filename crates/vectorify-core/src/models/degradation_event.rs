use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which cache operation degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOperation {
    Get,
    Put,
}

/// A recorded cache degradation: the pipeline kept working (the vector was
/// recomputed or returned anyway) but storage misbehaved. Operators drain
/// these so a degraded cache is never mistaken for a healthy one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDegradation {
    pub namespace: String,
    pub key: String,
    pub operation: CacheOperation,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
