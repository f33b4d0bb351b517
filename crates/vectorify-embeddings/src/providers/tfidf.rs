//! Hashed TF-IDF embedder.
//!
//! A statistical layer that requires a fit pass: fit learns inverse
//! document frequencies over the corpus, encode weights term frequency by
//! the learned IDF and hashes terms into fixed-dimension buckets. Works
//! anywhere — no model downloads, no network.

use std::collections::HashMap;

use vectorify_core::config::defaults;
use vectorify_core::errors::EmbedError;
use vectorify_core::{EmbedderIdentity, LayerSpec, TextEmbedder, VectorifyResult};
use vectorify_core::errors::ConfigError;

struct IdfTable {
    /// Per-term IDF learned during fit.
    idf: HashMap<String, f32>,
    /// IDF assigned to terms never seen during fit.
    unseen_idf: f32,
}

/// TF-IDF embedding provider with a hashed fixed-dimension output.
pub struct TfIdfEmbedder {
    name: String,
    identity: EmbedderIdentity,
    dimensions: usize,
    min_token_len: usize,
    table: Option<IdfTable>,
}

impl TfIdfEmbedder {
    pub fn new(name: impl Into<String>, dimensions: usize, min_token_len: usize) -> Self {
        let identity = EmbedderIdentity::new("tfidf")
            .with_param("dimensions", dimensions as i64)
            .with_param("min_token_len", min_token_len as i64);
        Self {
            name: name.into(),
            identity,
            dimensions,
            min_token_len,
            table: None,
        }
    }

    /// Build from a layer spec, applying defaults for omitted params.
    /// Unknown or out-of-range params fail here, never silently.
    pub fn from_spec(spec: &LayerSpec) -> Result<Self, ConfigError> {
        let mut dimensions = defaults::DEFAULT_TFIDF_DIMENSIONS;
        let mut min_token_len = defaults::DEFAULT_MIN_TOKEN_LEN;
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
                "min_token_len" => {
                    min_token_len =
                        value
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
                        reason: "unrecognized parameter for strategy `tfidf`".to_string(),
                    });
                }
            }
        }
        Ok(Self::new(&spec.name, dimensions, min_token_len))
    }

    /// Hash a term into a bucket index using FNV-1a.
    fn hash_term(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h as usize) % dims
    }

    /// Lowercase alphanumeric terms, length-filtered.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| s.chars().count() >= self.min_token_len)
            .map(|s| s.to_lowercase())
            .collect()
    }
}

impl TextEmbedder for TfIdfEmbedder {
    fn fit(&mut self, corpus: &[String]) -> VectorifyResult<()> {
        if corpus.is_empty() {
            return Err(EmbedError::EmptyCorpus {
                layer: self.name.clone(),
            }
            .into());
        }

        // Document frequencies over the corpus.
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let mut seen: Vec<String> = self.tokenize(doc);
            seen.sort();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_default() += 1;
            }
        }

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1. Unseen terms get the
        // df = 0 value.
        let n = corpus.len() as f32;
        let idf = df
            .into_iter()
            .map(|(term, count)| (term, ((1.0 + n) / (1.0 + count as f32)).ln() + 1.0))
            .collect();
        self.table = Some(IdfTable {
            idf,
            unseen_idf: (1.0 + n).ln() + 1.0,
        });
        Ok(())
    }

    fn encode(&self, text: &str) -> VectorifyResult<Vec<f32>> {
        let Some(table) = &self.table else {
            return Err(EmbedError::FitRequired {
                layer: self.name.clone(),
            }
            .into());
        };

        let tokens = self.tokenize(text);
        let mut vector = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return Ok(vector);
        }

        let mut tf: HashMap<String, f32> = HashMap::new();
        for token in &tokens {
            *tf.entry(token.clone()).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        for (term, count) in &tf {
            let freq = count / total;
            let idf = table.idf.get(term).copied().unwrap_or(table.unseen_idf);
            let bucket = Self::hash_term(term, self.dimensions);
            vector[bucket] += freq * idf;
        }

        // L2 normalize.
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
        true
    }

    fn is_ready(&self) -> bool {
        self.table.is_some()
    }
}
