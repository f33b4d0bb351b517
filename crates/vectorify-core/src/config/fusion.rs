use serde::{Deserialize, Serialize};

/// The rule for combining per-layer vectors into one fused vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// Stack layer vectors in declared layer order. Output dimension is the
    /// sum of layer dimensions, so every layer must be present.
    Concat,
    /// Weighted average over available layers, renormalized by the sum of
    /// the weights that actually participated.
    Weighted,
    /// Like `weighted`, but per-input weights are a softmax over the L2
    /// norms of the aligned layer vectors. Deterministic — no randomness.
    Attention,
}

/// How vectors of differing natural dimensionality are brought to a common
/// length before `weighted`/`attention` fusion. Fixed per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// Zero-pad every vector to the largest participating dimension.
    /// Lossless; the default.
    PadToMax,
    /// Truncate every vector to the smallest participating dimension.
    TruncateToMin,
}

impl Default for AlignmentStrategy {
    fn default() -> Self {
        AlignmentStrategy::PadToMax
    }
}

fn default_false() -> bool {
    false
}

/// Fusion policy for one pipeline instance. Immutable after construction —
/// changing the policy means building a new pipeline, since fused vectors
/// are not policy-aware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub method: FusionMethod,
    /// L2-normalize the final fused vector. For `concat` this applies to the
    /// concatenated whole, never to the sub-vectors.
    #[serde(default = "default_false")]
    pub normalize: bool,
    #[serde(default)]
    pub alignment: AlignmentStrategy,
}

impl FusionConfig {
    pub fn new(method: FusionMethod) -> Self {
        Self {
            method,
            normalize: false,
            alignment: AlignmentStrategy::default(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentStrategy) -> Self {
        self.alignment = alignment;
        self
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::new(FusionMethod::Weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_are_snake_case() {
        let json = serde_json::to_string(&FusionConfig::new(FusionMethod::Attention)).unwrap();
        assert!(json.contains("\"attention\""));
        assert!(json.contains("\"pad_to_max\""));
    }

    #[test]
    fn missing_optional_fields_default() {
        let cfg: FusionConfig = serde_json::from_str(r#"{"method":"concat"}"#).unwrap();
        assert_eq!(cfg.method, FusionMethod::Concat);
        assert!(!cfg.normalize);
        assert_eq!(cfg.alignment, AlignmentStrategy::PadToMax);
    }
}
