//! # vectorify-embeddings
//!
//! Multi-layer text embedding with a persistent content-addressable cache.
//!
//! The pipeline is declared as an ordered set of layers (each an embedding
//! strategy plus its parameters), fit once against a corpus where required,
//! and then encodes batches cache-first: every (layer, text) pair is
//! fingerprinted from the layer's full identity, looked up in a two-tier
//! cache, and only computed on a miss. Per-layer vectors are fused by a
//! fixed policy (`concat`, `weighted`, or `attention`) into one vector per
//! input.
//!
//! ```no_run
//! use vectorify_core::config::{FusionConfig, FusionMethod};
//! use vectorify_core::{LayerSpec, PipelineConfig};
//! use vectorify_embeddings::{MultiLayerEmbedder, VectorCache};
//!
//! # fn main() -> vectorify_core::VectorifyResult<()> {
//! let config = PipelineConfig::new(
//!     vec![
//!         LayerSpec::new("stat", "tfidf").with_weight(0.6),
//!         LayerSpec::new("ngram", "char-ngram").with_weight(0.4),
//!     ],
//!     FusionConfig::new(FusionMethod::Weighted),
//! );
//! let cache = VectorCache::open("/tmp/vectorify-cache", 4096)?;
//! let mut pipeline = MultiLayerEmbedder::new(config, cache)?;
//!
//! let corpus = vec!["fit corpus line".to_string()];
//! pipeline.fit(&corpus);
//! let batch = pipeline.encode(&corpus);
//! assert!(batch.vectors[0].is_some());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod fusion;
pub mod multi_layer;
pub mod providers;

pub use cache::{CacheHitTier, DiskStore, MemoryTier, VectorCache};
pub use fusion::{FusionEngine, FusionInput};
pub use multi_layer::{
    EncodeFailure, FitFailure, FitReport, FuseFailure, FusedBatch, LayerBatch, MultiLayerEmbedder,
};
pub use providers::{CharNgramEmbedder, EmbedderFactory, EmbedderRegistry, TfIdfEmbedder};
