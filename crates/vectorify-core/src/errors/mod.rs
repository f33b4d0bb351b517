//! Error types for the vectorify system.
//!
//! One error family per concern, combined under [`VectorifyError`].
//! Propagation policy: config errors abort eagerly before any work starts;
//! cache, embed, and fusion errors are scoped to a (layer, input) pair and
//! are collected alongside partial results rather than aborting a batch.

mod cache_error;
mod config_error;
mod embed_error;
mod fusion_error;

pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use embed_error::EmbedError;
pub use fusion_error::FusionError;

/// Umbrella error for every vectorify operation.
#[derive(Debug, thiserror::Error)]
pub enum VectorifyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Fusion(#[from] FusionError),
}

/// Result alias used across the workspace.
pub type VectorifyResult<T> = Result<T, VectorifyError>;
