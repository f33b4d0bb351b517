use crate::errors::VectorifyResult;
use crate::identity::EmbedderIdentity;

/// A single embedding strategy: converts text into a fixed-dimension vector.
///
/// Implementations must be deterministic given identical internal trained
/// state — the content-addressable cache depends on it.
pub trait TextEmbedder: Send + Sync {
    /// Train on a corpus. Only meaningful when [`requires_fit`] is true;
    /// stateless strategies accept any corpus and do nothing.
    ///
    /// [`requires_fit`]: TextEmbedder::requires_fit
    fn fit(&mut self, corpus: &[String]) -> VectorifyResult<()>;

    /// Embed a single text, returning a vector of `dimensions()` floats.
    fn encode(&self, text: &str) -> VectorifyResult<Vec<f32>>;

    /// Embed a batch of texts. Must match per-text `encode` results.
    fn encode_batch(&self, texts: &[String]) -> VectorifyResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// The dimensionality of vectors produced by this embedder.
    fn dimensions(&self) -> usize;

    /// The full configuration identity used for fingerprinting.
    fn identity(&self) -> &EmbedderIdentity;

    /// Whether this strategy needs a fit pass before it can encode.
    fn requires_fit(&self) -> bool;

    /// Whether encode may be called right now (always true for
    /// strategies that do not require fit).
    fn is_ready(&self) -> bool;
}

impl std::fmt::Debug for dyn TextEmbedder + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEmbedder")
            .field("identity", self.identity())
            .finish_non_exhaustive()
    }
}
