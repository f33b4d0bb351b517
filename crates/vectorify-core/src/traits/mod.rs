//! Capability traits consumed across the workspace.

mod embedding;

pub use embedding::TextEmbedder;
