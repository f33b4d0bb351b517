use serde::{Deserialize, Serialize};

/// Fit lifecycle state of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerState {
    /// May encode now.
    Ready,
    /// Declared `requires_fit` and has not been fit yet.
    NeedsFit,
    /// A fit attempt failed; encode calls for this layer fail until refit.
    Failed(String),
}

/// Introspection record for one layer of a multi-layer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerInfo {
    pub strategy: String,
    pub dimensions: usize,
    pub weight: f32,
    pub requires_fit: bool,
    pub state: LayerState,
}
