//! Chart bundle construction.
//!
//! ## `build` steps
//!
//! 1. Check `values.yaml`, `Chart.yaml` and `templates/` exist (nothing
//!    expensive happens before this).
//! 2. Parse the descriptor and the values file.
//! 3. Render the value overrides.
//! 4. Hash the whole source tree.
//! 5. Pack the archive in memory.
//!
//! A [`Bundle`] is built fresh on every call and never cached.

use std::path::{Path, PathBuf};

use cicd_core::types::{storage_key, BundleId, ChartName, ContentHash, DEFAULT_CATEGORY};

use crate::archive::{self, Member, OVERRIDE_MEMBER};
use crate::descriptor::{
    read_descriptor, read_values, ChartDescriptor, DESCRIPTOR_FILE, TEMPLATES_DIR, VALUES_FILE,
};
use crate::digest;
use crate::error::ChartError;
use crate::overrides::render_overrides;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Validated input to [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Chart source directory.
    pub source: PathBuf,
    /// Caller-ordered `(key, value)` overrides.
    pub overrides: Vec<(String, String)>,
    /// Optional allow-list for override keys.
    pub allowed_keys: Option<Vec<String>>,
    /// Storage key category prefix.
    pub category: String,
}

impl BuildRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            overrides: Vec::new(),
            allowed_keys: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn with_overrides(mut self, overrides: Vec<(String, String)>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_allowed_keys(mut self, keys: Option<Vec<String>>) -> Self {
        self.allowed_keys = keys;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// A built, immutable chart bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// First 12 hex characters of `content_hash`.
    pub id: BundleId,
    pub content_hash: ContentHash,
    pub name: ChartName,
    pub descriptor: ChartDescriptor,
    pub override_text: String,
    pub category: String,
    /// Complete zip archive.
    pub archive: Vec<u8>,
}

impl Bundle {
    /// `"<category>/<name>-<id>.zip"`, or `None` when the chart has no name.
    pub fn storage_key(&self) -> Option<String> {
        storage_key(&self.category, &self.name, &self.id)
    }
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

/// Build a bundle from the chart directory named in `request`.
pub fn build(request: &BuildRequest) -> Result<Bundle, ChartError> {
    let source = request.source.as_path();
    let (descriptor_path, values_path, templates_dir) = check_inputs(source)?;

    let descriptor = read_descriptor(&descriptor_path)?;
    let values = read_values(&values_path)?;
    if values.value.is_null() {
        tracing::debug!("{} is empty", values_path.display());
    }

    let override_text = render_overrides(&request.overrides, request.allowed_keys.as_deref());

    let content_hash = digest::hash_dir(source)?;
    let id = content_hash.bundle_id();

    let mut members = vec![
        Member::new(VALUES_FILE, values.raw.as_str()),
        Member::new(OVERRIDE_MEMBER, override_text.as_str()),
        Member::new(DESCRIPTOR_FILE, descriptor.raw.as_str()),
    ];
    members.extend(archive::collect_templates(&templates_dir)?);
    let archive = archive::pack(&members)?;

    let bundle = Bundle {
        id,
        content_hash,
        name: ChartName::from(descriptor.value.name.clone()),
        descriptor: descriptor.value,
        override_text,
        category: request.category.clone(),
        archive,
    };
    tracing::info!(
        "built chart '{}' id={} ({} members, {} bytes)",
        bundle.name,
        bundle.id,
        members.len(),
        bundle.archive.len()
    );
    Ok(bundle)
}

/// Existence checks, in the order values → descriptor → templates.
fn check_inputs(source: &Path) -> Result<(PathBuf, PathBuf, PathBuf), ChartError> {
    let values = source.join(VALUES_FILE);
    let descriptor = source.join(DESCRIPTOR_FILE);
    let templates = source.join(TEMPLATES_DIR);

    if !values.is_file() {
        return Err(ChartError::MissingInput { path: values });
    }
    if !descriptor.is_file() {
        return Err(ChartError::MissingInput { path: descriptor });
    }
    if !templates.is_dir() {
        return Err(ChartError::MissingInput { path: templates });
    }
    Ok((descriptor, values, templates))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
