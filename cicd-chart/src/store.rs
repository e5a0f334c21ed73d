//! Content-addressed chart store.
//!
//! Objects live under their storage key (`helm/demo-0123456789ab.zip`) with a
//! metadata map alongside; the full content hash travels under
//! [`HASH_META_KEY`]. A stored object without that key is treated as absent.
//!
//! [`DirStore`] keeps objects on the local filesystem:
//!
//! ```text
//! <root>/
//!   helm/
//!     demo-0123456789ab.zip
//!     demo-0123456789ab.zip.meta.json
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;

use cicd_core::state::ChartRecord;
use cicd_core::types::{storage_key, HASH_META_KEY};

use crate::builder::Bundle;
use crate::error::{io_err, ChartError};

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredObject {
    pub size: u64,
    pub metadata: BTreeMap<String, String>,
}

impl StoredObject {
    /// The full content hash recorded at upload time, if any.
    pub fn content_hash(&self) -> Option<&str> {
        self.metadata
            .get(HASH_META_KEY)
            .map(String::as_str)
            .filter(|h| !h.is_empty())
    }
}

/// A key/value object store addressed by chart storage keys.
pub trait ChartStore {
    /// Store `body` under `key`, replacing any previous object.
    fn put(
        &self,
        key: &str,
        body: &[u8],
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), ChartError>;

    /// Metadata for `key`, or `None` if nothing is stored there.
    fn head(&self, key: &str) -> Result<Option<StoredObject>, ChartError>;

    /// Remove the object at `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), ChartError>;
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Outcome of a best-effort [`remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    /// The record has no storage key; nothing to delete.
    Skipped,
    /// The delete failed; the failure was logged and swallowed.
    FailedButIgnored(String),
}

/// Upload `bundle` and return the record the caller should persist.
pub fn publish(
    store: &impl ChartStore,
    bundle: &Bundle,
    source: &Path,
) -> Result<ChartRecord, ChartError> {
    let key = bundle.storage_key().ok_or_else(|| ChartError::Unaddressable {
        name: bundle.name.to_string(),
    })?;

    let mut metadata = BTreeMap::new();
    metadata.insert(HASH_META_KEY.to_string(), bundle.content_hash.to_string());
    store.put(&key, &bundle.archive, &metadata)?;
    tracing::info!("published {key}");

    Ok(ChartRecord {
        id: bundle.id.clone(),
        name: bundle.name.clone(),
        archive: key,
        hash: bundle.content_hash.to_string(),
        source: source.to_path_buf(),
        category: bundle.category.clone(),
        updated_at: Utc::now(),
    })
}

/// Read back the stored object for `record`.
///
/// A missing object, a missing hash header, or a failing store all mean
/// "needs rebuild": `archive` and `hash` come back empty. Never an error.
pub fn refresh(store: &impl ChartStore, record: &ChartRecord) -> ChartRecord {
    let mut out = record.clone();
    let found = storage_key(&record.category, &record.name, &record.id).and_then(|key| {
        match store.head(&key) {
            Ok(Some(object)) => object.content_hash().map(|h| (key, h.to_string())),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("reading {key} failed, treating as absent: {err}");
                None
            }
        }
    });

    match found {
        Some((key, hash)) => {
            out.archive = key;
            out.hash = hash;
        }
        None => {
            tracing::debug!("chart '{}' needs rebuild", record.name);
            out.archive.clear();
            out.hash.clear();
        }
    }
    out
}

/// Best-effort delete of the stored object for `record`.
pub fn remove(store: &impl ChartStore, record: &ChartRecord) -> Removal {
    let Some(key) = storage_key(&record.category, &record.name, &record.id) else {
        return Removal::Skipped;
    };
    match store.delete(&key) {
        Ok(()) => {
            tracing::info!("removed {key}");
            Removal::Deleted
        }
        Err(err) => {
            tracing::warn!("removal of {key} failed (silenced): {err}");
            Removal::FailedButIgnored(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// DirStore
// ---------------------------------------------------------------------------

/// Filesystem-backed [`ChartStore`].
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` under the root, rejecting anything but plain segments.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, ChartError> {
        let rel = Path::new(key);
        let plain = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(ChartError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(rel))
    }

    fn meta_path(object: &Path) -> PathBuf {
        PathBuf::from(format!("{}.meta.json", object.display()))
    }
}

impl ChartStore for DirStore {
    fn put(
        &self,
        key: &str,
        body: &[u8],
        metadata: &BTreeMap<String, String>,
    ) -> Result<(), ChartError> {
        let path = self.object_path(key)?;
        let meta = Self::meta_path(&path);
        let json = serde_json::to_vec_pretty(metadata).map_err(|source| ChartError::Metadata {
            path: meta.clone(),
            source,
        })?;
        write_atomic(&path, body)?;
        write_atomic(&meta, &json)?;
        Ok(())
    }

    fn head(&self, key: &str) -> Result<Option<StoredObject>, ChartError> {
        let path = self.object_path(key)?;
        let stat = match std::fs::metadata(&path) {
            Ok(stat) => stat,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path, e)),
        };

        let meta = Self::meta_path(&path);
        let metadata = match std::fs::read(&meta) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| ChartError::Metadata {
                path: meta.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_err(&meta, e)),
        };

        Ok(Some(StoredObject {
            size: stat.len(),
            metadata,
        }))
    }

    fn delete(&self, key: &str) -> Result<(), ChartError> {
        let path = self.object_path(key)?;
        for target in [Self::meta_path(&path), path] {
            match std::fs::remove_file(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err(&target, e)),
            }
        }
        Ok(())
    }
}

/// Write to `<path>.tmp` then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ChartError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
