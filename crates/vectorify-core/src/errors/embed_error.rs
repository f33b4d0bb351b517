/// Errors raised by embedding layers during fit or encode.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("layer `{layer}` requires fit() before encode()")]
    FitRequired { layer: String },

    #[error("fit failed for layer `{layer}`: {reason}")]
    FitFailed { layer: String, reason: String },

    #[error("encode failed for layer `{layer}`: {reason}")]
    ComputeFailed { layer: String, reason: String },

    #[error("fit corpus is empty for layer `{layer}`")]
    EmptyCorpus { layer: String },
}
