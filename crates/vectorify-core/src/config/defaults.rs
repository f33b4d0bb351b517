//! Default values shared by config types and built-in providers.

/// Default output dimensionality for the hashed TF-IDF strategy.
pub const DEFAULT_TFIDF_DIMENSIONS: usize = 512;

/// Tokens shorter than this are dropped by the TF-IDF tokenizer.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Default output dimensionality for the char-ngram strategy.
pub const DEFAULT_NGRAM_DIMENSIONS: usize = 256;

/// Default character n-gram size.
pub const DEFAULT_NGRAM_SIZE: usize = 3;

/// Default layer weight when a spec does not declare one.
pub const DEFAULT_LAYER_WEIGHT: f32 = 1.0;

/// Default L1 in-memory cache capacity (entries).
pub const DEFAULT_L1_CAPACITY: u64 = 4096;
