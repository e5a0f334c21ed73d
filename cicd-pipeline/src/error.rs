//! Error types for cicd-pipeline.

use cicd_core::types::PipelineKind;
use thiserror::Error;

/// All errors that can arise from pipeline activation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A field the pipeline kind requires is empty.
    #[error("{kind} pipeline requires `{field}`")]
    MissingField {
        kind: PipelineKind,
        field: &'static str,
    },

    /// The control plane could not be reached.
    #[error("cannot reach control plane: POST {url}: {message}")]
    Transport { url: String, message: String },

    /// The control plane answered with a non-success status.
    #[error("API responded with status {status} ({body})")]
    ActivationRejected { status: u16, body: String },

    /// The control plane answered for a different pipeline.
    #[error("IDs don't match, found {found}, expected {expected}")]
    IdentityMismatch { expected: String, found: String },

    /// First activation succeeded without issuing a secret.
    #[error("control plane issued no secret for new pipeline {id}")]
    MissingSecret { id: String },

    /// The response body is not the expected JSON.
    #[error("cannot decode control plane response: {source} ({body})")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be encoded.
    #[error("cannot encode request: {0}")]
    Encode(#[source] serde_json::Error),
}
