//! MultiLayerEmbedder — the main entry point for vectorify-embeddings.
//!
//! Owns the ordered layer set, drives the fit/encode lifecycle, routes every
//! (layer, text) pair through the content-addressable cache, and hands the
//! per-layer vectors to the fusion engine. Partial-failure semantics
//! throughout: one layer or one input failing never aborts its siblings.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use vectorify_core::errors::EmbedError;
use vectorify_core::models::{CacheDegradation, CacheOperation, LayerInfo, LayerState};
use vectorify_core::{
    fingerprint, namespace_digest, PipelineConfig, TextEmbedder, VectorifyError, VectorifyResult,
};

use crate::cache::VectorCache;
use crate::fusion::{FusionEngine, FusionInput};
use crate::providers::EmbedderRegistry;

/// One configured layer: spec, its cache namespace, and the live embedder.
#[derive(Debug)]
struct Layer {
    name: String,
    weight: f32,
    namespace: String,
    embedder: Box<dyn TextEmbedder>,
    /// Set when a fit attempt failed; encode for this layer fails until a
    /// successful refit.
    fit_error: Option<String>,
}

impl Layer {
    fn state(&self) -> LayerState {
        if let Some(reason) = &self.fit_error {
            LayerState::Failed(reason.clone())
        } else if self.embedder.requires_fit() && !self.embedder.is_ready() {
            LayerState::NeedsFit
        } else {
            LayerState::Ready
        }
    }
}

/// Outcome of fitting a pipeline: which layers trained, which failed.
#[derive(Debug, Default)]
pub struct FitReport {
    pub fitted: Vec<String>,
    pub failures: Vec<FitFailure>,
}

impl FitReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct FitFailure {
    pub layer: String,
    pub error: VectorifyError,
}

/// A failure scoped to one (layer, input) pair.
#[derive(Debug)]
pub struct EncodeFailure {
    pub layer: String,
    pub input_index: usize,
    pub error: VectorifyError,
}

/// Per-layer vectors for a batch of texts. `vectors[layer][i]` is `None`
/// exactly when `failures` carries an entry for that (layer, i).
#[derive(Debug, Default)]
pub struct LayerBatch {
    pub vectors: BTreeMap<String, Vec<Option<Vec<f32>>>>,
    pub failures: Vec<EncodeFailure>,
}

/// A fusion failure scoped to one input.
#[derive(Debug)]
pub struct FuseFailure {
    pub input_index: usize,
    pub error: VectorifyError,
}

/// Fused vectors for a batch, plus everything that went wrong on the way.
#[derive(Debug, Default)]
pub struct FusedBatch {
    pub vectors: Vec<Option<Vec<f32>>>,
    pub layer_failures: Vec<EncodeFailure>,
    pub fusion_failures: Vec<FuseFailure>,
}

/// Multi-layer embedding pipeline over a shared vector cache.
#[derive(Debug)]
pub struct MultiLayerEmbedder {
    layers: Vec<Layer>,
    fusion: FusionEngine,
    cache: VectorCache,
    config: PipelineConfig,
    degradations: Mutex<Vec<CacheDegradation>>,
}

impl MultiLayerEmbedder {
    /// Build a pipeline from a validated config, using the built-in
    /// strategy registry. The cache handle is passed in explicitly — its
    /// lifecycle belongs to the caller, not to process-wide state.
    pub fn new(config: PipelineConfig, cache: VectorCache) -> VectorifyResult<Self> {
        Self::with_registry(config, cache, &EmbedderRegistry::default())
    }

    /// Build a pipeline resolving strategies against a caller-supplied
    /// registry (the seam for external embedders).
    pub fn with_registry(
        config: PipelineConfig,
        cache: VectorCache,
        registry: &EmbedderRegistry,
    ) -> VectorifyResult<Self> {
        config.validate()?;

        let mut layers = Vec::with_capacity(config.layers.len());
        for spec in &config.layers {
            let embedder = registry.create(spec)?;
            let namespace = namespace_digest(embedder.identity());
            debug!(
                layer = %spec.name,
                strategy = %spec.strategy,
                namespace = %namespace,
                "layer constructed"
            );
            layers.push(Layer {
                name: spec.name.clone(),
                weight: spec.weight,
                namespace,
                embedder,
                fit_error: None,
            });
        }

        info!(
            layers = layers.len(),
            fusion = ?config.fusion.method,
            "multi-layer embedder initialized"
        );
        Ok(Self {
            fusion: FusionEngine::new(config.fusion),
            layers,
            cache,
            config,
            degradations: Mutex::new(Vec::new()),
        })
    }

    /// Load the pipeline declaration from a JSON config file.
    pub fn from_config_file(
        path: impl AsRef<Path>,
        cache: VectorCache,
    ) -> VectorifyResult<Self> {
        let config = PipelineConfig::from_file(path)?;
        Self::new(config, cache)
    }

    /// Save the pipeline declaration to a JSON config file.
    pub fn save_config(&self, path: impl AsRef<Path>) -> VectorifyResult<()> {
        self.config.save(path)?;
        Ok(())
    }

    /// Fit every layer that requires it, in registration order. A layer's
    /// fit failure is fatal to that layer but never aborts its siblings.
    pub fn fit(&mut self, corpus: &[String]) -> FitReport {
        let mut report = FitReport::default();
        for layer in &mut self.layers {
            if !layer.embedder.requires_fit() {
                continue;
            }
            match layer.embedder.fit(corpus) {
                Ok(()) => {
                    layer.fit_error = None;
                    debug!(layer = %layer.name, corpus_len = corpus.len(), "layer fit");
                    report.fitted.push(layer.name.clone());
                }
                Err(error) => {
                    warn!(layer = %layer.name, error = %error, "layer fit failed");
                    layer.fit_error = Some(error.to_string());
                    report.failures.push(FitFailure {
                        layer: layer.name.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Encode every text through every layer, cache-first.
    ///
    /// Layers are independent: a failure in one layer is recorded per
    /// (layer, text) and the other layers still return results. Texts
    /// within a layer run batch-parallel.
    pub fn encode_layers(&self, texts: &[String]) -> LayerBatch {
        let mut batch = LayerBatch::default();

        for layer in &self.layers {
            match layer.state() {
                LayerState::Ready => {}
                LayerState::NeedsFit => {
                    // No cache reads or writes for an unfit layer.
                    for index in 0..texts.len() {
                        batch.failures.push(EncodeFailure {
                            layer: layer.name.clone(),
                            input_index: index,
                            error: EmbedError::FitRequired {
                                layer: layer.name.clone(),
                            }
                            .into(),
                        });
                    }
                    batch
                        .vectors
                        .insert(layer.name.clone(), vec![None; texts.len()]);
                    continue;
                }
                LayerState::Failed(reason) => {
                    for index in 0..texts.len() {
                        batch.failures.push(EncodeFailure {
                            layer: layer.name.clone(),
                            input_index: index,
                            error: EmbedError::FitFailed {
                                layer: layer.name.clone(),
                                reason: reason.clone(),
                            }
                            .into(),
                        });
                    }
                    batch
                        .vectors
                        .insert(layer.name.clone(), vec![None; texts.len()]);
                    continue;
                }
            }

            let results: Vec<Result<Vec<f32>, VectorifyError>> = texts
                .par_iter()
                .map(|text| self.encode_one(layer, text))
                .collect();

            let mut vectors = Vec::with_capacity(texts.len());
            for (index, result) in results.into_iter().enumerate() {
                match result {
                    Ok(vector) => vectors.push(Some(vector)),
                    Err(error) => {
                        vectors.push(None);
                        batch.failures.push(EncodeFailure {
                            layer: layer.name.clone(),
                            input_index: index,
                            error,
                        });
                    }
                }
            }
            batch.vectors.insert(layer.name.clone(), vectors);
        }
        batch
    }

    /// Encode and fuse. An input fails only if fusion cannot proceed for it
    /// (e.g. a missing layer under `concat`); `weighted` and `attention`
    /// renormalize over whatever layers are available.
    pub fn encode(&self, texts: &[String]) -> FusedBatch {
        let layer_batch = self.encode_layers(texts);
        let mut fused = FusedBatch {
            vectors: Vec::with_capacity(texts.len()),
            ..Default::default()
        };

        for index in 0..texts.len() {
            let mut inputs = Vec::with_capacity(self.layers.len());
            for layer in &self.layers {
                if let Some(Some(vector)) = layer_batch
                    .vectors
                    .get(&layer.name)
                    .and_then(|column| column.get(index))
                    .map(|cell| cell.as_ref())
                {
                    inputs.push(FusionInput {
                        weight: layer.weight,
                        vector,
                    });
                }
            }
            match self.fusion.fuse(&inputs, self.layers.len()) {
                Ok(vector) => fused.vectors.push(Some(vector)),
                Err(error) => {
                    fused.vectors.push(None);
                    fused.fusion_failures.push(FuseFailure {
                        input_index: index,
                        error: error.into(),
                    });
                }
            }
        }

        fused.layer_failures = layer_batch.failures;
        fused
    }

    /// Cache-first encode of one (layer, text) pair.
    ///
    /// A cache read failure is surfaced as a degradation event and the
    /// vector is recomputed; a write failure after a successful compute
    /// never loses the vector to the caller.
    fn encode_one(&self, layer: &Layer, text: &str) -> Result<Vec<f32>, VectorifyError> {
        let key = fingerprint(layer.embedder.identity(), text);

        match self.cache.get(&layer.namespace, &key) {
            Ok(Some((vector, tier))) => {
                debug!(layer = %layer.name, key = %key, tier = ?tier, "cache hit");
                return Ok(vector);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(
                    layer = %layer.name,
                    key = %key,
                    error = %error,
                    "cache read failed, recomputing"
                );
                self.record_degradation(layer, &key, CacheOperation::Get, &error);
            }
        }

        let vector = layer.embedder.encode(text)?;

        if let Err(error) = self.cache.put(&layer.namespace, &key, &vector) {
            warn!(
                layer = %layer.name,
                key = %key,
                error = %error,
                "cache write failed, returning computed vector anyway"
            );
            self.record_degradation(layer, &key, CacheOperation::Put, &error);
        }
        Ok(vector)
    }

    fn record_degradation(
        &self,
        layer: &Layer,
        key: &vectorify_core::CacheKey,
        operation: CacheOperation,
        error: &VectorifyError,
    ) {
        self.degradations
            .lock()
            .expect("degradation lock poisoned")
            .push(CacheDegradation {
                namespace: layer.namespace.clone(),
                key: key.to_hex(),
                operation,
                reason: error.to_string(),
                timestamp: Utc::now(),
            });
    }

    /// Drain accumulated cache degradation events.
    pub fn drain_degradation_events(&self) -> Vec<CacheDegradation> {
        std::mem::take(
            &mut *self
                .degradations
                .lock()
                .expect("degradation lock poisoned"),
        )
    }

    /// Introspection: per-layer strategy, dimensions, weight, fit state.
    pub fn layer_info(&self) -> BTreeMap<String, LayerInfo> {
        self.layers
            .iter()
            .map(|layer| {
                (
                    layer.name.clone(),
                    LayerInfo {
                        strategy: layer.embedder.identity().strategy().to_string(),
                        dimensions: layer.embedder.dimensions(),
                        weight: layer.weight,
                        requires_fit: layer.embedder.requires_fit(),
                        state: layer.state(),
                    },
                )
            })
            .collect()
    }

    /// Declared layer names, in registration order.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// The cache namespace backing one layer, for external tooling.
    pub fn layer_namespace(&self, name: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.namespace.as_str())
    }

    /// The shared cache handle (stats, listings, invalidation).
    pub fn cache(&self) -> &VectorCache {
        &self.cache
    }
}
