//! # vectorify-core
//!
//! Foundation crate for the vectorify embedding system.
//! Defines identities, fingerprinting, traits, errors, models, and config.
//! The embeddings crate builds the cache and pipeline on top of this.

pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod identity;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{FusionConfig, FusionMethod, LayerSpec, PipelineConfig};
pub use errors::{VectorifyError, VectorifyResult};
pub use fingerprint::{fingerprint, namespace_digest, CacheKey};
pub use identity::{EmbedderIdentity, ParamValue};
pub use traits::TextEmbedder;
