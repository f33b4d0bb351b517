use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::fusion::FusionConfig;
use super::layer::LayerSpec;
use crate::errors::ConfigError;

/// Full declaration of a multi-layer pipeline: the ordered layers plus the
/// fusion policy. JSON-serializable so pipelines round-trip through config
/// files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub fusion: FusionConfig,
}

impl PipelineConfig {
    pub fn new(layers: Vec<LayerSpec>, fusion: FusionConfig) -> Self {
        Self { layers, fusion }
    }

    /// Eager validation: no layers, duplicate names, and per-layer problems
    /// all fail here, before any embedder is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::EmptyPipeline);
        }
        let mut seen = BTreeSet::new();
        for spec in &self.layers {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateLayer {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Load and validate a pipeline config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save this config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::FileWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| ConfigError::FileWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
