//! Caller-owned local state: what was built and what was registered.
//!
//! # Storage layout
//!
//! ```text
//! ~/.cicd/
//!   state.yaml      (mode 0600, created on first save)
//! ```
//!
//! The chart builder and the pipeline synchronizer never touch this file;
//! the caller persists the identifiers, hashes and secrets they return.
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::types::{BundleId, ChartName, PipelineHandle, PipelineKind};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A built and published chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub id: BundleId,
    pub name: ChartName,
    /// Storage key of the archive; empty when the stored object is gone.
    #[serde(default)]
    pub archive: String,
    /// Full content hash; empty when the stored object is gone.
    #[serde(default)]
    pub hash: String,
    /// Chart source directory the record was built from.
    pub source: PathBuf,
    /// Storage category used for the key.
    pub category: String,
    pub updated_at: DateTime<Utc>,
}

impl ChartRecord {
    /// `true` when the record no longer points at a stored archive.
    pub fn needs_rebuild(&self) -> bool {
        self.archive.is_empty() || self.hash.is_empty()
    }
}

/// A pipeline declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub kind: PipelineKind,
    /// `None` until the first successful activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<PipelineHandle>,
    pub updated_at: DateTime<Utc>,
}

/// Root of the state YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StateFile {
    #[serde(default)]
    pub charts: BTreeMap<String, ChartRecord>,
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineRecord>,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.cicd/state.yaml`. Pure, no I/O.
pub fn state_path_at(home: &Path) -> PathBuf {
    home.join(".cicd").join("state.yaml")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the state file. A missing file is an empty state.
///
/// Returns `StateError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<StateFile, StateError> {
    let path = state_path_at(home);
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(StateFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| StateError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<StateFile, StateError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the state file.
///
/// Write flow: serialize → `state.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, state: &StateFile) -> Result<(), StateError> {
    let path = state_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(&path, std::io::Error::other("invalid state path")));
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        set_dir_permissions(dir)?;
    }

    let yaml = serde_yaml::to_string(state)?;
    let tmp = path.with_file_name("state.yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(state: &StateFile) -> Result<(), StateError> {
    save_at(&home()?, state)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, StateError> {
    dirs::home_dir().ok_or(StateError::HomeNotFound)
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StateError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StateError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
