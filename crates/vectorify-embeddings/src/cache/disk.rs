//! Persistent on-disk vector store.
//!
//! Layout: one directory per embedder-identity namespace under a caller
//! supplied root. Each entry is `<key-hex>.vec` holding raw little-endian
//! f32 bytes; `manifest.json` enumerates keys and dimensions so `stats` and
//! `list_entries` never read vector files.
//!
//! Writes land in a `.tmp` sibling and are renamed into place, so readers
//! never observe a torn entry. Manifest updates take a per-namespace lock;
//! there is no global lock across namespaces. Single-writer-at-a-time per
//! namespace is the assumed deployment model — identical (key, vector)
//! pairs written by independent processes are last-writer-wins safe.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vectorify_core::errors::CacheError;
use vectorify_core::models::{CacheEntryMeta, CacheStats};
use vectorify_core::{CacheKey, VectorifyResult};

const MANIFEST_FILE: &str = "manifest.json";
const ENTRY_EXT: &str = "vec";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    entries: BTreeMap<String, CacheEntryMeta>,
}

#[derive(Debug)]
struct NamespaceHandle {
    dir: PathBuf,
    manifest: Mutex<Manifest>,
}

impl NamespaceHandle {
    fn load(dir: PathBuf, namespace: &str) -> VectorifyResult<Self> {
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let raw =
                std::fs::read_to_string(&manifest_path).map_err(|e| CacheError::Io {
                    path: manifest_path.display().to_string(),
                    reason: e.to_string(),
                })?;
            serde_json::from_str(&raw).map_err(|e| CacheError::Manifest {
                namespace: namespace.to_string(),
                reason: e.to_string(),
            })?
        } else {
            Manifest::default()
        };
        Ok(Self {
            dir,
            manifest: Mutex::new(manifest),
        })
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Persist the manifest atomically (tmp + rename).
    fn persist_manifest(&self, manifest: &Manifest) -> Result<(), CacheError> {
        let path = self.dir.join(MANIFEST_FILE);
        let tmp = self.dir.join(format!("{MANIFEST_FILE}.tmp"));
        let json = serde_json::to_string(manifest).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Strict decode: the byte length must be exactly `dimensions * 4`.
/// A truncated file must surface as corruption, never as a silently
/// shorter vector.
fn bytes_to_vector(
    bytes: &[u8],
    dimensions: usize,
    namespace: &str,
    key: &CacheKey,
) -> Result<Vec<f32>, CacheError> {
    if bytes.len() != dimensions * 4 {
        return Err(CacheError::Corrupt {
            namespace: namespace.to_string(),
            key: key.to_hex(),
            details: format!(
                "expected {} bytes for {} dims, found {}",
                dimensions * 4,
                dimensions,
                bytes.len()
            ),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// The persistent tier of the vector cache.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    namespaces: DashMap<String, Arc<NamespaceHandle>>,
}

impl DiskStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> VectorifyResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| CacheError::Io {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            root,
            namespaces: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle for a namespace, creating its directory if needed. Only the
    /// write path calls this.
    fn handle(&self, namespace: &str) -> VectorifyResult<Arc<NamespaceHandle>> {
        if let Some(h) = self.namespaces.get(namespace) {
            return Ok(h.value().clone());
        }
        let loaded = Arc::new(NamespaceHandle::load(
            self.root.join(namespace),
            namespace,
        )?);
        // If another thread raced us here, keep the handle that won — two
        // live handles for one namespace would mean two manifest locks.
        let entry = self
            .namespaces
            .entry(namespace.to_string())
            .or_insert(loaded);
        Ok(entry.value().clone())
    }

    /// Handle for a namespace that already exists on disk. Read paths use
    /// this so a lookup against an unknown namespace is a plain miss and
    /// never needs write access to the store root.
    fn existing_handle(&self, namespace: &str) -> VectorifyResult<Option<Arc<NamespaceHandle>>> {
        if let Some(h) = self.namespaces.get(namespace) {
            return Ok(Some(h.value().clone()));
        }
        if !self.root.join(namespace).exists() {
            return Ok(None);
        }
        self.handle(namespace).map(Some)
    }

    /// Look up one vector. `Ok(None)` is a miss; `Err` means storage
    /// misbehaved for this specific key and the caller decides whether to
    /// recompute or abort.
    pub fn get(&self, namespace: &str, key: &CacheKey) -> VectorifyResult<Option<Vec<f32>>> {
        let Some(handle) = self.existing_handle(namespace)? else {
            return Ok(None);
        };
        let meta = {
            let manifest = handle.manifest.lock().expect("manifest lock poisoned");
            manifest.entries.get(&key.to_hex()).cloned()
        };
        let Some(meta) = meta else {
            return Ok(None);
        };
        let path = handle.entry_path(key);
        let bytes = std::fs::read(&path).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let vector = bytes_to_vector(&bytes, meta.dimensions, namespace, key)?;
        Ok(Some(vector))
    }

    /// Store one vector. Idempotent: re-putting an identical vector is a
    /// no-op. Putting a *different* vector for an existing key is flagged
    /// as version skew and rejected — it means an embedder that
    /// fingerprints identically but behaves differently, which is a
    /// configuration bug, not a cache update.
    pub fn put(&self, namespace: &str, key: &CacheKey, vector: &[f32]) -> VectorifyResult<()> {
        let handle = self.handle(namespace)?;
        let mut manifest = handle.manifest.lock().expect("manifest lock poisoned");

        let hex = key.to_hex();
        if let Some(existing) = manifest.entries.get(&hex) {
            let path = handle.entry_path(key);
            match std::fs::read(&path) {
                Ok(bytes) => match bytes_to_vector(&bytes, existing.dimensions, namespace, key) {
                    Ok(stored) if stored == vector => {
                        debug!(namespace, key = %hex, "idempotent put, entry unchanged");
                        return Ok(());
                    }
                    Ok(_) => {
                        warn!(
                            namespace,
                            key = %hex,
                            "put with different vector for existing key, rejecting as version skew"
                        );
                        return Err(CacheError::VersionSkew {
                            namespace: namespace.to_string(),
                            key: hex,
                        }
                        .into());
                    }
                    // Stored entry is corrupt; fall through and repair it.
                    Err(_) => {
                        debug!(namespace, key = %hex, "overwriting corrupt entry");
                    }
                },
                // Entry file vanished; fall through and rewrite it.
                Err(_) => {
                    debug!(namespace, key = %hex, "manifest entry without file, rewriting");
                }
            }
        }

        let path = handle.entry_path(key);
        let tmp = handle.dir.join(format!("{hex}.{ENTRY_EXT}.tmp"));
        let bytes = vector_to_bytes(vector);
        std::fs::write(&tmp, &bytes).map_err(|e| CacheError::Io {
            path: tmp.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        manifest.entries.insert(
            hex,
            CacheEntryMeta {
                dimensions: vector.len(),
                bytes: bytes.len() as u64,
                created_at: Utc::now(),
            },
        );
        handle.persist_manifest(&manifest)?;
        debug!(namespace, entries = manifest.entries.len(), "disk cache insert");
        Ok(())
    }

    /// Names of every namespace directory under the root.
    pub fn namespace_names(&self) -> VectorifyResult<Vec<String>> {
        let mut names = Vec::new();
        let iter = std::fs::read_dir(&self.root).map_err(|e| CacheError::Io {
            path: self.root.display().to_string(),
            reason: e.to_string(),
        })?;
        for entry in iter {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.root.display().to_string(),
                reason: e.to_string(),
            })?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Aggregate statistics across every namespace. Reads manifests only,
    /// never vector files.
    pub fn stats(&self) -> VectorifyResult<CacheStats> {
        let namespaces = self.namespace_names()?;
        let mut stats = CacheStats {
            namespaces: namespaces.clone(),
            ..Default::default()
        };
        for ns in &namespaces {
            let handle = self.handle(ns)?;
            let manifest = handle.manifest.lock().expect("manifest lock poisoned");
            stats.entries += manifest.entries.len();
            stats.total_bytes += manifest.entries.values().map(|m| m.bytes).sum::<u64>();
        }
        Ok(stats)
    }

    /// Enumerate one namespace's entries (key + metadata, no vectors).
    ///
    /// The manifest is snapshotted under the lock; keys parse lazily as the
    /// iterator is consumed. Finite, and restartable by calling again. An
    /// unknown namespace yields an empty sequence.
    pub fn list_entries(
        &self,
        namespace: &str,
    ) -> VectorifyResult<impl Iterator<Item = VectorifyResult<(CacheKey, CacheEntryMeta)>>> {
        let entries: BTreeMap<String, CacheEntryMeta> = match self.existing_handle(namespace)? {
            Some(handle) => {
                let manifest = handle.manifest.lock().expect("manifest lock poisoned");
                manifest.entries.clone()
            }
            None => BTreeMap::new(),
        };
        let namespace = namespace.to_string();
        Ok(entries.into_iter().map(move |(hex, meta)| {
            let key = CacheKey::from_hex(&hex).ok_or_else(|| CacheError::Manifest {
                namespace: namespace.clone(),
                reason: format!("unparseable key in manifest: {hex}"),
            })?;
            Ok((key, meta))
        }))
    }

    /// Remove every entry in one namespace. Irreversible.
    pub fn clear(&self, namespace: &str) -> VectorifyResult<()> {
        self.namespaces.remove(namespace);
        let dir = self.root.join(namespace);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| CacheError::Io {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Remove every namespace. Irreversible.
    pub fn clear_all(&self) -> VectorifyResult<()> {
        for ns in self.namespace_names()? {
            self.clear(&ns)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vectorify_core::errors::VectorifyError;
    use vectorify_core::{fingerprint, EmbedderIdentity};

    fn key(text: &str) -> CacheKey {
        fingerprint(&EmbedderIdentity::new("tfidf").with_param("dimensions", 8), text)
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let k = key("roundtrip");
        let v = vec![1.0f32, 2.5, -3.7, 0.0];
        store.put("ns", &k, &v).unwrap();
        assert_eq!(store.get("ns", &k).unwrap(), Some(v));
    }

    #[test]
    fn miss_is_ok_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(store.get("ns", &key("missing")).unwrap(), None);
    }

    #[test]
    fn idempotent_put_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let k = key("idem");
        store.put("ns", &k, &[1.0, 2.0]).unwrap();
        store.put("ns", &k, &[1.0, 2.0]).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn conflicting_put_is_version_skew_and_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let k = key("skew");
        store.put("ns", &k, &[1.0, 2.0]).unwrap();

        let err = store.put("ns", &k, &[9.0, 9.0]).unwrap_err();
        assert!(matches!(
            err,
            VectorifyError::Cache(CacheError::VersionSkew { .. })
        ));
        assert_eq!(store.get("ns", &k).unwrap(), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn corrupt_entry_surfaces_error_for_that_key_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let good = key("good");
        let bad = key("bad");
        store.put("ns", &good, &[1.0, 2.0]).unwrap();
        store.put("ns", &bad, &[3.0, 4.0]).unwrap();

        // Truncate the bad entry to a length that is not dims * 4.
        let bad_path = dir.path().join("ns").join(format!("{bad}.vec"));
        std::fs::write(&bad_path, [0u8, 0, 0, 0, 0xFF]).unwrap();

        let err = store.get("ns", &bad).unwrap_err();
        assert!(matches!(
            err,
            VectorifyError::Cache(CacheError::Corrupt { .. })
        ));
        assert_eq!(store.get("ns", &good).unwrap(), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn special_floats_survive_byte_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let k = key("special");
        let v = vec![f32::MIN_POSITIVE, f32::MAX, -0.0, f32::INFINITY, f32::NEG_INFINITY];
        store.put("ns", &k, &v).unwrap();
        let got = store.get("ns", &k).unwrap().unwrap();
        assert_eq!(got[0], f32::MIN_POSITIVE);
        assert_eq!(got[1], f32::MAX);
        assert!(got[2].is_sign_negative() && got[2] == 0.0);
        assert!(got[3].is_infinite() && got[3].is_sign_positive());
        assert!(got[4].is_infinite() && got[4].is_sign_negative());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let k = key("persist");
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.put("ns", &k, &[7.0]).unwrap();
        }
        {
            let store = DiskStore::open(dir.path()).unwrap();
            assert_eq!(store.get("ns", &k).unwrap(), Some(vec![7.0]));
            assert_eq!(store.stats().unwrap().entries, 1);
        }
    }

    #[test]
    fn stats_and_list_entries_read_manifest_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        store.put("ns_a", &key("1"), &[1.0, 2.0, 3.0]).unwrap();
        store.put("ns_a", &key("2"), &[4.0, 5.0, 6.0]).unwrap();
        store.put("ns_b", &key("3"), &[7.0]).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.total_bytes, 12 + 12 + 4);
        assert_eq!(stats.namespaces, vec!["ns_a".to_string(), "ns_b".to_string()]);

        let listed: Vec<_> = store
            .list_entries("ns_a")
            .unwrap()
            .collect::<VectorifyResult<_>>()
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|(_, meta)| meta.dimensions == 3));

        // Restartable: enumerating again yields the same sequence.
        let again: Vec<_> = store
            .list_entries("ns_a")
            .unwrap()
            .collect::<VectorifyResult<_>>()
            .unwrap();
        assert_eq!(listed, again);
    }

    #[test]
    fn read_paths_never_create_namespace_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        assert_eq!(store.get("ghost", &key("nothing")).unwrap(), None);
        assert_eq!(store.list_entries("ghost").unwrap().count(), 0);

        // A miss must not need write access or leak an empty namespace.
        assert!(!dir.path().join("ghost").exists());
        assert!(store.stats().unwrap().namespaces.is_empty());
    }

    #[test]
    fn clear_namespace_leaves_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let ka = key("a");
        let kb = key("b");
        store.put("ns_a", &ka, &[1.0]).unwrap();
        store.put("ns_b", &kb, &[2.0]).unwrap();

        store.clear("ns_a").unwrap();
        assert_eq!(store.get("ns_a", &ka).unwrap(), None);
        assert_eq!(store.get("ns_b", &kb).unwrap(), Some(vec![2.0]));
    }

    #[test]
    fn clear_all_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        store.put("ns_a", &key("a"), &[1.0]).unwrap();
        store.put("ns_b", &key("b"), &[2.0]).unwrap();
        store.clear_all().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 0);
        assert!(stats.namespaces.is_empty());
    }

    #[test]
    fn empty_vector_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let k = key("empty");
        store.put("ns", &k, &[]).unwrap();
        assert_eq!(store.get("ns", &k).unwrap(), Some(vec![]));
    }
}
