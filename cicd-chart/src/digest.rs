//! Directory digest: the content address of a chart.
//!
//! ## Algorithm
//!
//! 1. Walk every regular file under the root. Symlinks are followed, so a
//!    linked file is hashed through its target, the same bytes the archive
//!    packs. A link cycle is an error.
//! 2. SHA-256 each file's bytes.
//! 3. Emit one summary line per file: `"<hex>  <relative/path>\n"`, using `/`
//!    as the separator on every platform.
//! 4. Sort the lines by relative path.
//! 5. SHA-256 the concatenated summary and hex-encode it (64 characters).
//!
//! Enumeration order and file metadata never reach step 5, so two trees with
//! the same relative-path/content pairs always share a digest.

use std::ffi::OsStr;
use std::fs::File;
use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use cicd_core::types::ContentHash;

use crate::error::{io_err, ChartError};

/// Compute the content hash of the directory tree at `root`.
pub fn hash_dir(root: &Path) -> Result<ContentHash, ChartError> {
    let mut entries: Vec<(Vec<u8>, String)> = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_err(path, std::io::Error::from(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_name(root, entry.path());
        let digest = hash_file(entry.path())?;
        entries.push((rel, digest));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = Sha256::new();
    for (rel, digest) in &entries {
        summary.update(digest.as_bytes());
        summary.update(b"  ");
        summary.update(rel);
        summary.update(b"\n");
    }
    tracing::debug!("hashed {} file(s) under {}", entries.len(), root.display());
    Ok(ContentHash(hex::encode(summary.finalize())))
}

/// SHA-256 hex digest of a single file, streamed.
pub fn hash_file(path: &Path) -> Result<String, ChartError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut h = Sha256::new();
    std::io::copy(&mut file, &mut h).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(h.finalize()))
}

/// SHA-256 hex digest of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `/`-joined raw bytes of `path` relative to `root`.
fn relative_name(root: &Path, path: &Path) -> Vec<u8> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<Vec<u8>> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(name_bytes(part)),
            _ => None,
        })
        .collect();
    parts.join(&b'/')
}

#[cfg(unix)]
fn name_bytes(part: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    part.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn name_bytes(part: &OsStr) -> Vec<u8> {
    part.to_string_lossy().into_owned().into_bytes()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
