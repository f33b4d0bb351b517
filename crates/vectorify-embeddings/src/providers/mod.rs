//! Built-in embedding strategies and the strategy registry.
//!
//! Strategies are pluggable: the registry maps a strategy name to a factory
//! producing a boxed [`TextEmbedder`]. New strategies (neural, API-backed)
//! register a factory and need no orchestrator changes.

mod char_ngram;
mod tfidf;

pub use char_ngram::CharNgramEmbedder;
pub use tfidf::TfIdfEmbedder;

use std::collections::BTreeMap;

use vectorify_core::errors::ConfigError;
use vectorify_core::{LayerSpec, TextEmbedder, VectorifyResult};

/// Factory producing a configured embedder from a layer spec.
pub type EmbedderFactory =
    Box<dyn Fn(&LayerSpec) -> VectorifyResult<Box<dyn TextEmbedder>> + Send + Sync>;

/// Registry of embedding strategies, keyed by strategy name.
pub struct EmbedderRegistry {
    factories: BTreeMap<String, EmbedderFactory>,
}

impl EmbedderRegistry {
    /// An empty registry with no strategies.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a strategy. Replaces any previous factory of the same name.
    pub fn register(&mut self, name: impl Into<String>, factory: EmbedderFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Construct an embedder for `spec`, or fail eagerly with a config
    /// error: unknown strategies are never silently defaulted.
    pub fn create(&self, spec: &LayerSpec) -> VectorifyResult<Box<dyn TextEmbedder>> {
        spec.validate()?;
        let factory =
            self.factories
                .get(&spec.strategy)
                .ok_or_else(|| ConfigError::UnknownStrategy {
                    strategy: spec.strategy.clone(),
                })?;
        factory(spec)
    }

    /// Names of every registered strategy, sorted.
    pub fn strategies(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for EmbedderRegistry {
    /// Registry with the built-in strategies: `tfidf` and `char-ngram`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "tfidf",
            Box::new(|spec| Ok(Box::new(TfIdfEmbedder::from_spec(spec)?) as Box<dyn TextEmbedder>)),
        );
        registry.register(
            "char-ngram",
            Box::new(|spec| {
                Ok(Box::new(CharNgramEmbedder::from_spec(spec)?) as Box<dyn TextEmbedder>)
            }),
        );
        registry
    }
}
