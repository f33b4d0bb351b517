//! Embedder identity: the complete configuration of one embedding strategy.
//!
//! Two identities are equal iff the strategy name and every configuration
//! field are equal. The canonical serialization sorts fields by key (via
//! `BTreeMap`) and stringifies values with a fixed, lossless representation,
//! so equivalent configurations always fingerprint identically regardless of
//! construction order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Append `{byte_len}:{s}` so arbitrary caller-controlled bytes (separator
/// characters included) can never spell out extra structure in the
/// canonical form.
fn push_len_prefixed(out: &mut String, s: &str) {
    out.push_str(&s.len().to_string());
    out.push(':');
    out.push_str(s);
}

/// A single configuration value for an embedder.
///
/// Canonical form is type-tagged (`i:3` vs `s:1:3`) so values of different
/// types never collide in the fingerprint. Floats use Rust's shortest
/// round-trip formatting — lossless and locale-independent. String payloads
/// are length-prefixed since their bytes are caller-controlled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
}

impl ParamValue {
    /// Append the canonical form of this value to `out`.
    pub(crate) fn write_canonical(&self, out: &mut String) {
        match self {
            ParamValue::Bool(b) => {
                out.push_str("b:");
                out.push_str(if *b { "true" } else { "false" });
            }
            ParamValue::Int(i) => {
                out.push_str("i:");
                out.push_str(&i.to_string());
            }
            ParamValue::Float(f) => {
                out.push_str("f:");
                out.push_str(&format!("{f:?}"));
            }
            ParamValue::Str(s) => {
                out.push_str("s:");
                push_len_prefixed(out, s);
            }
            ParamValue::IntList(v) => {
                out.push_str("l:");
                let joined: Vec<String> = v.iter().map(|i| i.to_string()).collect();
                out.push_str(&joined.join(","));
            }
        }
    }

    /// Interpret this value as a positive usize, if possible.
    pub fn as_positive_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(i) if *i > 0 => Some(*i as usize),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// The identity of a configured embedder: strategy name plus every
/// configuration field that affects its output.
///
/// Immutable once constructed. This is the unit that scopes a cache
/// namespace — distinct identities never share storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedderIdentity {
    strategy: String,
    params: BTreeMap<String, ParamValue>,
}

impl EmbedderIdentity {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn from_params(
        strategy: impl Into<String>,
        params: BTreeMap<String, ParamValue>,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            params,
        }
    }

    /// Builder-style param setter, used by provider constructors.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// Canonical serialization: strategy, then `key=value` pairs in sorted
    /// key order, joined by the ASCII unit separator. The strategy, every
    /// key, and every string payload are length-prefixed, so the encoding
    /// is injective: no choice of bytes inside one field can imitate the
    /// separators of another. This string is the fingerprint input — it
    /// must be stable across processes and releases.
    pub fn canonical_string(&self) -> String {
        let mut out = String::with_capacity(64);
        push_len_prefixed(&mut out, &self.strategy);
        for (key, value) in &self.params {
            out.push('\u{1f}');
            push_len_prefixed(&mut out, key);
            out.push('=');
            value.write_canonical(&mut out);
        }
        out
    }
}

impl fmt::Display for EmbedderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.strategy)?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            for (i, (key, value)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let mut s = String::new();
                value.write_canonical(&mut s);
                write!(f, "{key}={s}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
