/// Configuration errors. All of these are fatal at construction time —
/// a pipeline is never built from a partially valid config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown embedding strategy: {strategy}")]
    UnknownStrategy { strategy: String },

    #[error("invalid parameter `{key}` for layer `{layer}`: {reason}")]
    InvalidParam {
        layer: String,
        key: String,
        reason: String,
    },

    #[error("invalid layer `{layer}`: {reason}")]
    InvalidLayer { layer: String, reason: String },

    #[error("duplicate layer name: {name}")]
    DuplicateLayer { name: String },

    #[error("pipeline has no layers")]
    EmptyPipeline,

    #[error("failed to read config file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("failed to write config file {path}: {reason}")]
    FileWrite { path: String, reason: String },

    #[error("malformed config file {path}: {reason}")]
    Malformed { path: String, reason: String },
}
