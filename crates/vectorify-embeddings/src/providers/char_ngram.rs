//! Hashed character n-gram embedder.
//!
//! A stateless layer: no fit pass, always ready. Stands in for pretrained
//! encoders in pipelines and tests — deterministic, language-agnostic, and
//! robust to tokenization differences since it works on raw characters.

use vectorify_core::config::defaults;
use vectorify_core::errors::ConfigError;
use vectorify_core::{EmbedderIdentity, LayerSpec, TextEmbedder, VectorifyResult};

/// Character n-gram embedding provider.
pub struct CharNgramEmbedder {
    identity: EmbedderIdentity,
    dimensions: usize,
    ngram: usize,
}

impl CharNgramEmbedder {
    pub fn new(dimensions: usize, ngram: usize) -> Self {
        let identity = EmbedderIdentity::new("char-ngram")
            .with_param("dimensions", dimensions as i64)
            .with_param("ngram", ngram as i64);
        Self {
            identity,
            dimensions,
            ngram,
        }
    }

    pub fn from_spec(spec: &LayerSpec) -> Result<Self, ConfigError> {
        let mut dimensions = defaults::DEFAULT_NGRAM_DIMENSIONS;
        let mut ngram = defaults::DEFAULT_NGRAM_SIZE;
        for (key, value) in &spec.params {
            match key.as_str() {
                "dimensions" => {
                    dimensions =
                        value
                            .as_positive_usize()
                            .ok_or_else(|| ConfigError::InvalidParam {
                                layer: spec.name.clone(),
                                key: key.clone(),
                                reason: "expected a positive integer".to_string(),
                            })?;
                }
                "ngram" => {
                    ngram = value
                        .as_positive_usize()
                        .ok_or_else(|| ConfigError::InvalidParam {
                            layer: spec.name.clone(),
                            key: key.clone(),
                            reason: "expected a positive integer".to_string(),
                        })?;
                }
                _ => {
                    return Err(ConfigError::InvalidParam {
                        layer: spec.name.clone(),
                        key: key.clone(),
                        reason: "unrecognized parameter for strategy `char-ngram`".to_string(),
                    });
                }
            }
        }
        Ok(Self::new(dimensions, ngram))
    }

    /// FNV-1a over the n-gram's chars, bucketed into the output dimension.
    fn hash_ngram(window: &[char], dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for c in window {
            for b in c.to_string().as_bytes() {
                h ^= *b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
        }
        (h as usize) % dims
    }
}

impl TextEmbedder for CharNgramEmbedder {
    fn fit(&mut self, _corpus: &[String]) -> VectorifyResult<()> {
        // Stateless: nothing to learn.
        Ok(())
    }

    fn encode(&self, text: &str) -> VectorifyResult<Vec<f32>> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        let mut vector = vec![0.0f32; self.dimensions];
        if chars.len() < self.ngram {
            return Ok(vector);
        }

        for window in chars.windows(self.ngram) {
            let bucket = Self::hash_ngram(window, self.dimensions);
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    fn requires_fit(&self) -> bool {
        false
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_without_fit() {
        let e = CharNgramEmbedder::new(128, 3);
        assert!(e.is_ready());
        assert!(!e.requires_fit());
        assert_eq!(e.encode("no fit needed").unwrap().len(), 128);
    }

    #[test]
    fn deterministic() {
        let e = CharNgramEmbedder::new(256, 3);
        assert_eq!(e.encode("stable").unwrap(), e.encode("stable").unwrap());
    }

    #[test]
    fn text_shorter_than_ngram_is_zero_vector() {
        let e = CharNgramEmbedder::new(64, 3);
        let v = e.encode("ab").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn output_is_normalized() {
        let e = CharNgramEmbedder::new(256, 3);
        let v = e.encode("character ngrams for the win").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn similar_strings_closer_than_dissimilar() {
        let e = CharNgramEmbedder::new(512, 3);
        let a = e.encode("embedding cache").unwrap();
        let b = e.encode("embedding caches").unwrap();
        let c = e.encode("quarterly report").unwrap();

        let cos_ab: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let cos_ac: f32 = a.iter().zip(&c).map(|(x, y)| x * y).sum();
        assert!(cos_ab > cos_ac);
    }

    #[test]
    fn from_spec_round_trips_params() {
        let spec = LayerSpec::new("ng", "char-ngram")
            .with_param("dimensions", 64)
            .with_param("ngram", 2);
        let e = CharNgramEmbedder::from_spec(&spec).unwrap();
        assert_eq!(e.dimensions(), 64);
        assert!(e.identity().canonical_string().contains("ngram=i:2"));
    }

    #[test]
    fn from_spec_rejects_unknown_param() {
        let spec = LayerSpec::new("ng", "char-ngram").with_param("window", 5);
        assert!(CharNgramEmbedder::from_spec(&spec).is_err());
    }
}
