//! Fusion of per-layer vectors into a single representation.
//!
//! Three policies: `concat` (positional, all layers required), `weighted`
//! (declared weights, renormalized over available layers), and `attention`
//! (per-input weights from a deterministic softmax over layer vector norms).
//! Layers of differing dimensionality are aligned by the pipeline's fixed
//! [`AlignmentStrategy`] before `weighted`/`attention` fusion.

use vectorify_core::config::{AlignmentStrategy, FusionConfig, FusionMethod};
use vectorify_core::errors::FusionError;

/// One available layer's contribution to a fused vector.
pub struct FusionInput<'a> {
    pub weight: f32,
    pub vector: &'a [f32],
}

/// Stateless fusion engine, parameterized by an immutable policy.
#[derive(Debug)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse the available layer vectors for one input.
    ///
    /// `expected_layers` is the pipeline's declared layer count; `concat`
    /// fails when any layer is missing (positional slices would shift),
    /// while `weighted`/`attention` renormalize over what is present.
    /// Zero available layers is an error, never a zero vector.
    pub fn fuse(
        &self,
        inputs: &[FusionInput<'_>],
        expected_layers: usize,
    ) -> Result<Vec<f32>, FusionError> {
        if inputs.is_empty() {
            return Err(FusionError::NoLayers);
        }

        let mut fused = match self.config.method {
            FusionMethod::Concat => {
                if inputs.len() != expected_layers {
                    return Err(FusionError::MissingLayers {
                        available: inputs.len(),
                        expected: expected_layers,
                    });
                }
                let total: usize = inputs.iter().map(|i| i.vector.len()).sum();
                let mut out = Vec::with_capacity(total);
                for input in inputs {
                    out.extend_from_slice(input.vector);
                }
                out
            }
            FusionMethod::Weighted => {
                let aligned = align(inputs, self.config.alignment);
                let weights: Vec<f32> = inputs.iter().map(|i| i.weight).collect();
                weighted_sum(&aligned, &weights)?
            }
            FusionMethod::Attention => {
                let aligned = align(inputs, self.config.alignment);
                let weights = attention_weights(&aligned);
                weighted_sum(&aligned, &weights)?
            }
        };

        if self.config.normalize {
            l2_normalize(&mut fused);
        }
        Ok(fused)
    }
}

/// Bring all vectors to a common length per the fixed alignment strategy.
fn align(inputs: &[FusionInput<'_>], strategy: AlignmentStrategy) -> Vec<Vec<f32>> {
    let target = match strategy {
        AlignmentStrategy::PadToMax => {
            inputs.iter().map(|i| i.vector.len()).max().unwrap_or(0)
        }
        AlignmentStrategy::TruncateToMin => {
            inputs.iter().map(|i| i.vector.len()).min().unwrap_or(0)
        }
    };
    inputs
        .iter()
        .map(|input| {
            let mut v = input.vector.to_vec();
            v.resize(target, 0.0);
            v.truncate(target);
            v
        })
        .collect()
}

/// `Σ(wᵢ·vᵢ) / Σwᵢ` — missing layers have already dropped out of both
/// numerator and denominator by not being in `vectors`.
fn weighted_sum(vectors: &[Vec<f32>], weights: &[f32]) -> Result<Vec<f32>, FusionError> {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return Err(FusionError::ZeroWeight);
    }
    let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
    let mut out = vec![0.0f32; dim];
    for (vector, weight) in vectors.iter().zip(weights) {
        for (o, x) in out.iter_mut().zip(vector) {
            *o += weight * x;
        }
    }
    for o in &mut out {
        *o /= total;
    }
    Ok(out)
}

/// Deterministic per-input weights: softmax over the L2 norms of the
/// aligned layer vectors. Max-subtracted for numeric stability; no
/// randomness, no ordering dependence.
fn attention_weights(vectors: &[Vec<f32>]) -> Vec<f32> {
    let norms: Vec<f32> = vectors
        .iter()
        .map(|v| v.iter().map(|x| x * x).sum::<f32>().sqrt())
        .collect();
    let max = norms.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = norms.iter().map(|n| (n - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(method: FusionMethod) -> FusionEngine {
        FusionEngine::new(FusionConfig::new(method))
    }

    fn approx_eq(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len(), "length mismatch: {a:?} vs {b:?}");
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn weighted_two_layers_unit_weights_sum() {
        // Weights [0.6, 0.4] over [1,0,0] and [0,1,0] → [0.6, 0.4, 0.0].
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let fused = engine(FusionMethod::Weighted)
            .fuse(
                &[
                    FusionInput { weight: 0.6, vector: &a },
                    FusionInput { weight: 0.4, vector: &b },
                ],
                2,
            )
            .unwrap();
        approx_eq(&fused, &[0.6, 0.4, 0.0]);
    }

    #[test]
    fn weighted_missing_layer_renormalizes() {
        // One of two layers missing: output is exactly the surviving
        // layer's vector, because the denominator shrinks with it.
        let a = [2.0, 4.0];
        let fused = engine(FusionMethod::Weighted)
            .fuse(&[FusionInput { weight: 0.6, vector: &a }], 2)
            .unwrap();
        approx_eq(&fused, &a);
    }

    #[test]
    fn concat_preserves_declared_order_and_dims() {
        // 2-dim + 3-dim → 5-dim, 2-dim slice first, unnormalized.
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0];
        let fused = engine(FusionMethod::Concat)
            .fuse(
                &[
                    FusionInput { weight: 1.0, vector: &a },
                    FusionInput { weight: 1.0, vector: &b },
                ],
                2,
            )
            .unwrap();
        assert_eq!(fused, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn concat_missing_layer_is_fatal() {
        let a = [1.0, 2.0];
        let err = engine(FusionMethod::Concat)
            .fuse(&[FusionInput { weight: 1.0, vector: &a }], 2)
            .unwrap_err();
        assert!(matches!(err, FusionError::MissingLayers { available: 1, expected: 2 }));
    }

    #[test]
    fn single_layer_is_identity_under_every_policy() {
        let v = [0.5, -1.5, 3.0];
        for method in [FusionMethod::Concat, FusionMethod::Weighted, FusionMethod::Attention] {
            let fused = engine(method)
                .fuse(&[FusionInput { weight: 0.7, vector: &v }], 1)
                .unwrap();
            approx_eq(&fused, &v);
        }
    }

    #[test]
    fn zero_layers_is_error_not_zero_vector() {
        for method in [FusionMethod::Concat, FusionMethod::Weighted, FusionMethod::Attention] {
            let err = engine(method).fuse(&[], 2).unwrap_err();
            assert!(matches!(err, FusionError::NoLayers));
        }
    }

    #[test]
    fn zero_total_weight_is_error() {
        let a = [1.0];
        let err = engine(FusionMethod::Weighted)
            .fuse(&[FusionInput { weight: 0.0, vector: &a }], 1)
            .unwrap_err();
        assert!(matches!(err, FusionError::ZeroWeight));
    }

    #[test]
    fn pad_to_max_zero_extends_shorter_vectors() {
        let a = [1.0, 1.0];
        let b = [2.0, 2.0, 2.0, 2.0];
        let fused = engine(FusionMethod::Weighted)
            .fuse(
                &[
                    FusionInput { weight: 1.0, vector: &a },
                    FusionInput { weight: 1.0, vector: &b },
                ],
                2,
            )
            .unwrap();
        // Padded a = [1,1,0,0]; mean = [1.5, 1.5, 1.0, 1.0].
        approx_eq(&fused, &[1.5, 1.5, 1.0, 1.0]);
    }

    #[test]
    fn truncate_to_min_drops_tail() {
        let cfg = FusionConfig::new(FusionMethod::Weighted)
            .with_alignment(AlignmentStrategy::TruncateToMin);
        let a = [1.0, 1.0];
        let b = [3.0, 3.0, 3.0, 3.0];
        let fused = FusionEngine::new(cfg)
            .fuse(
                &[
                    FusionInput { weight: 1.0, vector: &a },
                    FusionInput { weight: 1.0, vector: &b },
                ],
                2,
            )
            .unwrap();
        approx_eq(&fused, &[2.0, 2.0]);
    }

    #[test]
    fn attention_equal_norms_is_uniform_mean() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let fused = engine(FusionMethod::Attention)
            .fuse(
                &[
                    FusionInput { weight: 1.0, vector: &a },
                    FusionInput { weight: 1.0, vector: &b },
                ],
                2,
            )
            .unwrap();
        approx_eq(&fused, &[0.5, 0.5]);
    }

    #[test]
    fn attention_favors_larger_norm() {
        let small = [0.1, 0.0];
        let large = [10.0, 0.0];
        let fused = engine(FusionMethod::Attention)
            .fuse(
                &[
                    FusionInput { weight: 1.0, vector: &small },
                    FusionInput { weight: 1.0, vector: &large },
                ],
                2,
            )
            .unwrap();
        // The large-norm layer should dominate the first component.
        assert!(fused[0] > 5.0, "got {fused:?}");
    }

    #[test]
    fn attention_is_deterministic() {
        let a = [0.3, 0.7, 0.1];
        let b = [0.9, 0.2, 0.4];
        let e = engine(FusionMethod::Attention);
        let inputs = || {
            vec![
                FusionInput { weight: 1.0, vector: &a },
                FusionInput { weight: 1.0, vector: &b },
            ]
        };
        assert_eq!(e.fuse(&inputs(), 2).unwrap(), e.fuse(&inputs(), 2).unwrap());
    }

    #[test]
    fn normalize_applies_to_final_vector() {
        let cfg = FusionConfig::new(FusionMethod::Concat).normalized();
        let a = [3.0];
        let b = [4.0];
        let fused = FusionEngine::new(cfg)
            .fuse(
                &[
                    FusionInput { weight: 1.0, vector: &a },
                    FusionInput { weight: 1.0, vector: &b },
                ],
                2,
            )
            .unwrap();
        // Whole-vector normalization: [3,4]/5, not per-sub-vector [1,1].
        approx_eq(&fused, &[0.6, 0.8]);
    }
}
