//! Domain types shared by the chart builder, the pipeline synchronizer and
//! the CLI.
//!
//! All types are serializable via serde; newtypes serialize as their inner
//! string so the state file stays flat.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage category used when the caller does not pick one.
pub const DEFAULT_CATEGORY: &str = "helm";

/// Metadata key carrying the full content hash next to a stored archive.
pub const HASH_META_KEY: &str = "chart-hash";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Chart name as declared in the chart descriptor.
    ChartName
);
string_newtype!(
    /// First 12 hex characters of a [`ContentHash`].
    BundleId
);
string_newtype!(
    /// 64-character hex SHA-256 digest over a chart directory.
    ContentHash
);
string_newtype!(
    /// Client-generated pipeline identifier (32 characters).
    PipelineId
);
string_newtype!(
    /// Server-issued pipeline secret.
    PipelineSecret
);

impl ContentHash {
    /// Length of the short identifier derived from a content hash.
    pub const ID_LEN: usize = 12;

    /// Short content-addressed identifier: the first 12 hex characters.
    ///
    /// Returns an empty id when the hash is shorter than 12 characters.
    pub fn bundle_id(&self) -> BundleId {
        BundleId(
            self.0
                .get(..Self::ID_LEN)
                .map(str::to_owned)
                .unwrap_or_default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Storage key
// ---------------------------------------------------------------------------

/// `"<category>/<name>-<id>.zip"`.
///
/// Returns `None` when `name` or `id` is empty: the bundle is not buildable
/// and has no location yet.
pub fn storage_key(category: &str, name: &ChartName, id: &BundleId) -> Option<String> {
    if name.is_empty() || id.is_empty() {
        return None;
    }
    Some(format!("{category}/{name}-{id}.zip"))
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// Kind of a remotely registered pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Helm,
    Terraform,
    Script,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Helm => write!(f, "helm"),
            PipelineKind::Terraform => write!(f, "terraform"),
            PipelineKind::Script => write!(f, "script"),
        }
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "helm" => Ok(Self::Helm),
            "terraform" => Ok(Self::Terraform),
            "script" => Ok(Self::Script),
            other => Err(format!(
                "unknown pipeline kind '{other}'; expected: helm, terraform, script"
            )),
        }
    }
}

/// Two-factor handle for a registered pipeline.
///
/// Both halves are always present: a pipeline without a handle has never
/// been activated, and every update or delete carries the stored secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineHandle {
    pub id: PipelineId,
    pub secret: PipelineSecret,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn bundle_id_is_first_twelve_chars() {
        let hash = ContentHash::from("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef");
        assert_eq!(hash.bundle_id().as_str(), "0123456789ab");
    }

    #[test]
    fn bundle_id_of_short_hash_is_empty() {
        assert!(ContentHash::from("abc").bundle_id().is_empty());
    }

    #[test]
    fn storage_key_format() {
        let key = storage_key("helm", &ChartName::from("demo"), &BundleId::from("0123456789ab"));
        assert_eq!(key.as_deref(), Some("helm/demo-0123456789ab.zip"));
    }

    #[rstest]
    #[case("", "0123456789ab")]
    #[case("demo", "")]
    #[case("", "")]
    fn storage_key_absent_when_name_or_id_empty(#[case] name: &str, #[case] id: &str) {
        assert!(storage_key("helm", &ChartName::from(name), &BundleId::from(id)).is_none());
    }

    #[rstest]
    #[case("helm", PipelineKind::Helm)]
    #[case("Terraform", PipelineKind::Terraform)]
    #[case("SCRIPT", PipelineKind::Script)]
    fn pipeline_kind_parses_case_insensitively(#[case] text: &str, #[case] kind: PipelineKind) {
        assert_eq!(text.parse::<PipelineKind>().unwrap(), kind);
    }

    #[test]
    fn pipeline_kind_rejects_unknown() {
        let err = "ansible".parse::<PipelineKind>().unwrap_err();
        assert!(err.contains("ansible"));
    }

    #[test]
    fn pipeline_kind_serializes_lowercase() {
        let yaml = serde_yaml::to_string(&PipelineKind::Terraform).unwrap();
        assert_eq!(yaml.trim(), "terraform");
    }

    #[test]
    fn handle_serializes_flat_strings() {
        let handle = PipelineHandle {
            id: PipelineId::from("id-1"),
            secret: PipelineSecret::from("s3cr3t"),
        };
        let yaml = serde_yaml::to_string(&handle).unwrap();
        assert!(yaml.contains("id: id-1"));
        assert!(yaml.contains("secret: s3cr3t"));
    }
}
