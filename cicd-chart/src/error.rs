//! Error types for cicd-chart.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building or storing a chart bundle.
#[derive(Debug, Error)]
pub enum ChartError {
    /// A required input file or directory is absent.
    #[error("{path} not found")]
    MissingInput { path: PathBuf },

    /// A structured input file failed to parse.
    #[error("failed to parse {path}: {source}")]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Packaging failed; no archive is returned.
    #[error("archive error at {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bundle has no storage key (empty chart name or id).
    #[error("chart '{name}' has no storage key; the descriptor needs a name")]
    Unaddressable { name: String },

    /// A storage key that would escape the store root.
    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },

    /// Store metadata sidecar could not be encoded or decoded.
    #[error("store metadata error at {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience constructor for [`ChartError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ChartError {
    ChartError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`ChartError::Archive`].
pub(crate) fn archive_err(path: impl Into<PathBuf>, message: impl ToString) -> ChartError {
    ChartError::Archive {
        path: path.into(),
        message: message.to_string(),
    }
}
