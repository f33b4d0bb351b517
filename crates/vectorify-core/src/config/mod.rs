//! Configuration types for layers, fusion, and whole pipelines.

pub mod defaults;
mod fusion;
mod layer;
mod pipeline;

pub use fusion::{AlignmentStrategy, FusionConfig, FusionMethod};
pub use layer::LayerSpec;
pub use pipeline::PipelineConfig;
