//! Deterministic fingerprinting of (embedder identity, input text) pairs.
//!
//! A fingerprint is a 256-bit blake3 digest, stable across processes and
//! restarts — a CLI run and a library run produce identical keys for
//! identical inputs, which is what makes cross-context cache reuse work.
//!
//! Text is hashed as its exact byte sequence: no trimming, no case folding,
//! no unicode normalization. Empty text is a valid, distinct input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::EmbedderIdentity;

/// A content-addressable cache key: blake3 digest of an
/// (identity, text) pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding, used for entry file names and manifest keys.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in &self.0 {
            s.push_str(&format!("{byte:02x}"));
        }
        s
    }

    /// Parse a 64-char lowercase hex string back into a key.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = ((hi << 4) | lo) as u8;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.to_hex())
    }
}

/// Fingerprint an embedding request.
///
/// Pure function, no I/O. The identity's canonical serialization is
/// length-prefixed before the text bytes so the two inputs can never
/// alias each other.
pub fn fingerprint(identity: &EmbedderIdentity, text: &str) -> CacheKey {
    let canonical = identity.canonical_string();
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(canonical.len() as u64).to_le_bytes());
    hasher.update(canonical.as_bytes());
    hasher.update(text.as_bytes());
    CacheKey(*hasher.finalize().as_bytes())
}

/// Digest of the identity alone — the storage namespace for one embedder.
///
/// Distinct identities get distinct namespaces, so even a (vanishingly
/// unlikely) key collision between embedders cannot cross-contaminate.
pub fn namespace_digest(identity: &EmbedderIdentity) -> String {
    blake3::hash(identity.canonical_string().as_bytes())
        .to_hex()
        .to_string()
}


#[cfg(test)]
mod prop_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn fingerprint_deterministic_for_any_input(
            strategy in "[a-z\\-]{1,16}",
            key in "[a-z_]{1,12}",
            value in any::<i64>(),
            text in ".*",
        ) {
            let id = EmbedderIdentity::new(strategy).with_param(key, value);
            prop_assert_eq!(fingerprint(&id, &text), fingerprint(&id, &text));
        }

        #[test]
        fn distinct_param_values_never_collide(
            key in "[a-z_]{1,12}",
            a in any::<i64>(),
            b in any::<i64>(),
            text in ".*",
        ) {
            prop_assume!(a != b);
            let ida = EmbedderIdentity::new("tfidf").with_param(key.clone(), a);
            let idb = EmbedderIdentity::new("tfidf").with_param(key, b);
            prop_assert_ne!(fingerprint(&ida, &text), fingerprint(&idb, &text));
        }

        #[test]
        fn structurally_different_identities_never_collide(
            a in any::<String>(),
            b in any::<String>(),
            text in ".*",
        ) {
            // Covers separator and `=` bytes inside values: a one-param
            // identity and a two-param identity must never share a key.
            let forged = EmbedderIdentity::new("tfidf")
                .with_param("k", crate::ParamValue::Str(format!("{a}\u{1f}{b}=s:x")));
            let genuine = EmbedderIdentity::new("tfidf")
                .with_param("k", crate::ParamValue::Str(a))
                .with_param(format!("{b}=s"), crate::ParamValue::Str("x".to_string()));
            prop_assert_ne!(fingerprint(&forged, &text), fingerprint(&genuine, &text));
        }

        #[test]
        fn hex_round_trips(text in ".*") {
            let id = EmbedderIdentity::new("tfidf");
            let k = fingerprint(&id, &text);
            prop_assert_eq!(CacheKey::from_hex(&k.to_hex()), Some(k));
        }
    }
}
