//! Provider configuration.
//!
//! Loaded from `<home>/.cicd/config.yaml`:
//!
//! ```yaml
//! api_root: https://pipelines.example.com
//! store_dir: /var/lib/cicd/charts   # optional, default <home>/.cicd/store
//! category: helm                    # optional
//! request_timeout_secs: 30          # optional
//! ```
//!
//! The value is built once by the caller and handed to each component; there
//! is no process-wide configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::DEFAULT_CATEGORY;

/// Environment variable that overrides `api_root`.
pub const API_ROOT_ENV: &str = "CICD_API_ROOT";

/// Resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Root URL of the pipelines control plane.
    pub api_root: String,
    /// Directory backing the content-addressed chart store.
    pub store_dir: PathBuf,
    /// Storage key category prefix.
    pub category: String,
    /// Per-request timeout for control-plane calls. `None` leaves the
    /// transport default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api_root: Option<String>,
    #[serde(default)]
    store_dir: Option<PathBuf>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

/// `<home>/.cicd/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".cicd").join("config.yaml")
}

/// Load the configuration rooted at `home`.
///
/// A missing file yields defaults with an empty `api_root`; call
/// [`ProviderConfig::validate`] before contacting the control plane.
pub fn load_at(home: &Path) -> Result<ProviderConfig, ConfigError> {
    let path = config_path_at(home);
    let file = if path.exists() {
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str::<Option<ConfigFile>>(&contents)
            .map_err(|source| ConfigError::Parse { path, source })?
            .unwrap_or_default()
    } else {
        ConfigFile::default()
    };

    Ok(ProviderConfig {
        api_root: file.api_root.unwrap_or_default(),
        store_dir: file
            .store_dir
            .unwrap_or_else(|| home.join(".cicd").join("store")),
        category: file
            .category
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        request_timeout_secs: file.request_timeout_secs,
    })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ProviderConfig, ConfigError> {
    load_at(&dirs::home_dir().ok_or(ConfigError::HomeNotFound)?)
}

impl ProviderConfig {
    /// Layer explicit overrides on top of the file values.
    ///
    /// Precedence: `flag` > `env` > file.
    pub fn with_api_root(mut self, flag: Option<String>, env: Option<String>) -> Self {
        let given = |v: Option<String>| v.filter(|r| !r.is_empty());
        if let Some(root) = given(flag).or_else(|| given(env)) {
            self.api_root = root;
        }
        self
    }

    /// Check the fields the control-plane client depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_root.is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_root",
                reason: format!("not provided (set it in the config file or ${API_ROOT_ENV})"),
            });
        }
        if !(self.api_root.starts_with("http://") || self.api_root.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "api_root",
                reason: format!("'{}' is not an http(s) URL", self.api_root),
            });
        }
        if self.category.is_empty() || self.category.contains('/') {
            return Err(ConfigError::Invalid {
                field: "category",
                reason: format!("'{}' must be a single non-empty path segment", self.category),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
