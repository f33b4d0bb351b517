/// Errors raised when combining per-layer vectors into a fused vector.
///
/// Fusion failures are scoped to a single input — they never abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error("no layer vectors available for fusion")]
    NoLayers,

    #[error(
        "concat fusion requires all {expected} layers, only {available} available \
         (missing layers change the output dimensionality)"
    )]
    MissingLayers { available: usize, expected: usize },

    #[error("total layer weight is zero, cannot renormalize")]
    ZeroWeight,
}
