use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;
use crate::identity::{EmbedderIdentity, ParamValue};

fn default_weight() -> f32 {
    defaults::DEFAULT_LAYER_WEIGHT
}

/// Declaration of one layer in a multi-layer pipeline.
///
/// `name` is the caller-facing label (unique within a pipeline); `strategy`
/// selects the embedder implementation; `params` configure it and become
/// part of the layer's cache identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub strategy: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// Non-negative fusion weight for `weighted` fusion.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: strategy.into(),
            params: BTreeMap::new(),
            weight: defaults::DEFAULT_LAYER_WEIGHT,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// The cache identity this spec resolves to: strategy plus params.
    /// Providers add their applied defaults on top so that an omitted
    /// param and its explicit default fingerprint identically.
    pub fn identity(&self) -> EmbedderIdentity {
        EmbedderIdentity::from_params(self.strategy.clone(), self.params.clone())
    }

    /// Eager validation. Never silently defaults a malformed field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::InvalidLayer {
                layer: self.name.clone(),
                reason: "layer name must not be empty".to_string(),
            });
        }
        if self.strategy.is_empty() {
            return Err(ConfigError::InvalidLayer {
                layer: self.name.clone(),
                reason: "strategy must not be empty".to_string(),
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ConfigError::InvalidLayer {
                layer: self.name.clone(),
                reason: format!("weight must be finite and non-negative, got {}", self.weight),
            });
        }
        for key in self.params.keys() {
            if key.is_empty() || key.chars().any(|c| c.is_control() || c == '=') {
                return Err(ConfigError::InvalidParam {
                    layer: self.name.clone(),
                    key: key.clone(),
                    reason: "param keys must be non-empty and free of control chars and '='"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}
