//! Shared data models.

mod cache_entry;
mod degradation_event;
mod layer_info;

pub use cache_entry::{CacheEntryMeta, CacheStats};
pub use degradation_event::{CacheDegradation, CacheOperation};
pub use layer_info::{LayerInfo, LayerState};
