//! Pipeline lifecycle: activate, read, deactivate.
//!
//! ```text
//! Unregistered --activate ok--> Registered(id, secret)
//! Registered   --activate ok--> Registered(id, secret')   same id
//! Registered   --deactivate---> Unregistered              any outcome
//! ```
//!
//! A failed activation leaves the caller's handle exactly as it was.

use uuid::Uuid;

use cicd_core::types::{PipelineHandle, PipelineId, PipelineSecret};
use cicd_core::ProviderConfig;

use crate::error::PipelineError;
use crate::spec::PipelineSpec;
use crate::transport::{Transport, UreqTransport};
use crate::wire::{ActivationResponse, DeactivationRequest, ACTIVATE_PATH, DEACTIVATE_PATH};

/// Outcome of a best-effort [`PipelineSync::deactivate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deactivation {
    /// The control plane acknowledged the deactivation.
    Deleted,
    /// No handle was known; nothing was sent.
    Skipped,
    /// The call failed; the failure was logged and swallowed.
    FailedButIgnored(String),
}

/// Client for the control-plane pipelines API.
#[derive(Debug, Clone)]
pub struct PipelineSync<T = UreqTransport> {
    api_root: String,
    transport: T,
}

impl PipelineSync<UreqTransport> {
    /// Build a client from validated provider configuration.
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_transport(&config.api_root, UreqTransport::from_config(config))
    }
}

impl<T: Transport> PipelineSync<T> {
    pub fn with_transport(api_root: &str, transport: T) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Create or refresh the pipeline described by `spec`.
    ///
    /// With no `handle` a fresh 32-character id is generated and the
    /// returned handle carries the secret the server issued. With a
    /// `handle` the same id and the stored secret are sent back; the
    /// returned handle keeps the old secret unless the server rotated it.
    pub fn activate(
        &self,
        spec: &PipelineSpec,
        handle: Option<&PipelineHandle>,
    ) -> Result<PipelineHandle, PipelineError> {
        spec.validate()?;

        // A record without an id is no record at all.
        let handle = handle.filter(|h| !h.id.is_empty());
        let id = match handle {
            Some(h) => h.id.clone(),
            None => new_pipeline_id(),
        };
        let request = spec.to_request(id.as_str(), handle.map(|h| h.secret.as_str()));
        let body = serde_json::to_string(&request).map_err(PipelineError::Encode)?;

        let url = self.url(ACTIVATE_PATH);
        tracing::debug!(id = %id, kind = %spec.kind(), refresh = handle.is_some(), "activating pipeline");
        let reply = self.transport.post_json(&url, &body)?;
        if !reply.is_success() {
            return Err(PipelineError::ActivationRejected {
                status: reply.status,
                body: reply.body,
            });
        }

        let response: ActivationResponse =
            serde_json::from_str(&reply.body).map_err(|source| PipelineError::Decode {
                body: reply.body.clone(),
                source,
            })?;
        if response.id != id.as_str() {
            return Err(PipelineError::IdentityMismatch {
                expected: id.to_string(),
                found: response.id,
            });
        }

        let issued = response.secret.filter(|s| !s.is_empty());
        let secret = match (issued, handle) {
            (Some(secret), _) => PipelineSecret::from(secret),
            (None, Some(h)) => h.secret.clone(),
            (None, None) => {
                return Err(PipelineError::MissingSecret { id: id.to_string() });
            }
        };

        tracing::info!(id = %id, kind = %spec.kind(), "pipeline activated");
        Ok(PipelineHandle { id, secret })
    }

    /// Local state is trusted as-is; the control plane is not consulted.
    ///
    /// Drift on the remote side goes unnoticed until the next activate or
    /// deactivate.
    pub fn read(&self, handle: Option<PipelineHandle>) -> Option<PipelineHandle> {
        handle
    }

    /// Unregister the pipeline. Never fails: deleting the remote
    /// registration must not block removal of the local record.
    pub fn deactivate(&self, handle: Option<&PipelineHandle>) -> Deactivation {
        let Some(handle) = handle.filter(|h| !h.id.is_empty()) else {
            return Deactivation::Skipped;
        };

        let payload = DeactivationRequest {
            id: handle.id.to_string(),
            secret: handle.secret.to_string(),
        };
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(err) => return self.ignored(handle, err.to_string()),
        };

        let url = self.url(DEACTIVATE_PATH);
        match self.transport.post_json(&url, &body) {
            Ok(reply) if reply.is_success() => {
                tracing::info!(id = %handle.id, "pipeline deactivated");
                Deactivation::Deleted
            }
            Ok(reply) => {
                tracing::warn!(
                    id = %handle.id,
                    status = reply.status,
                    body = %reply.body,
                    "deactivation bad status code (silenced)"
                );
                Deactivation::FailedButIgnored(format!(
                    "status {} ({})",
                    reply.status, reply.body
                ))
            }
            Err(err) => self.ignored(handle, err.to_string()),
        }
    }

    fn ignored(&self, handle: &PipelineHandle, reason: String) -> Deactivation {
        tracing::warn!(id = %handle.id, error = %reason, "deactivation error (silenced)");
        Deactivation::FailedButIgnored(reason)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_root)
    }
}

/// Random 32-character pipeline id.
fn new_pipeline_id() -> PipelineId {
    PipelineId(Uuid::new_v4().simple().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
