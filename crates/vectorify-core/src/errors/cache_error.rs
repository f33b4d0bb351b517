/// Cache-layer errors for the persistent vector store.
///
/// A cache *miss* is not an error — `get` returns `Ok(None)` for a miss.
/// Every variant here means storage misbehaved and must not be silently
/// folded into "recompute".
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failure at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("corrupt cache entry {key} in namespace {namespace}: {details}")]
    Corrupt {
        namespace: String,
        key: String,
        details: String,
    },

    #[error(
        "version skew for key {key} in namespace {namespace}: \
         a different vector is already stored for this fingerprint"
    )]
    VersionSkew { namespace: String, key: String },

    #[error("corrupt manifest for namespace {namespace}: {reason}")]
    Manifest { namespace: String, reason: String },
}
