//! Typed description of a pipeline, validated once before activation.

use std::collections::BTreeMap;

use cicd_core::types::PipelineKind;

use crate::error::PipelineError;
use crate::wire::ActivationRequest;

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineTarget {
    /// Packaged chart deploy.
    Helm {
        /// Storage key of the chart archive.
        archive: String,
        release: Option<String>,
        namespace: Option<String>,
    },
    /// Infrastructure plan/apply.
    Terraform {
        /// Storage key of the plan archive.
        archive: String,
        values: BTreeMap<String, String>,
    },
    /// Arbitrary command.
    Script {
        exec: String,
        plan: Option<String>,
        env: BTreeMap<String, String>,
    },
}

impl PipelineTarget {
    pub fn kind(&self) -> PipelineKind {
        match self {
            PipelineTarget::Helm { .. } => PipelineKind::Helm,
            PipelineTarget::Terraform { .. } => PipelineKind::Terraform,
            PipelineTarget::Script { .. } => PipelineKind::Script,
        }
    }
}

/// Everything the caller declares about one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub target: PipelineTarget,
    /// Git origin the source must come from.
    pub origin: Option<String>,
    /// Branches allowed to run, in declaration order.
    pub branches: Vec<String>,
    pub registry_url: Option<String>,
    pub registry_provider: Option<String>,
    pub approvals_required: u32,
    pub approvers: Vec<String>,
}

impl PipelineSpec {
    pub fn new(target: PipelineTarget) -> Self {
        Self {
            target,
            origin: None,
            branches: Vec::new(),
            registry_url: None,
            registry_provider: None,
            approvals_required: 0,
            approvers: Vec::new(),
        }
    }

    pub fn kind(&self) -> PipelineKind {
        self.target.kind()
    }

    /// Reject specs whose kind-specific required field is blank.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let (field, value) = match &self.target {
            PipelineTarget::Helm { archive, .. } | PipelineTarget::Terraform { archive, .. } => {
                ("archive", archive)
            }
            PipelineTarget::Script { exec, .. } => ("exec", exec),
        };
        if value.trim().is_empty() {
            return Err(PipelineError::MissingField {
                kind: self.kind(),
                field,
            });
        }
        Ok(())
    }

    /// Request body for activating this spec as pipeline `id`.
    pub(crate) fn to_request(&self, id: &str, secret: Option<&str>) -> ActivationRequest {
        let mut req = ActivationRequest {
            id: id.to_string(),
            secret: secret.map(str::to_string),
            kind: self.kind(),
            origin: non_empty(&self.origin),
            registry_url: non_empty(&self.registry_url),
            registry_provider: non_empty(&self.registry_provider),
            branches: self.branches.clone(),
            approvers: self.approvers.clone(),
            archive: None,
            release: None,
            namespace: None,
            exec: None,
            plan: None,
            env: BTreeMap::new(),
            values: BTreeMap::new(),
            approvals_required: self.approvals_required,
        };
        match &self.target {
            PipelineTarget::Helm {
                archive,
                release,
                namespace,
            } => {
                req.archive = Some(archive.clone());
                req.release = non_empty(release);
                req.namespace = non_empty(namespace);
            }
            PipelineTarget::Terraform { archive, values } => {
                req.archive = Some(archive.clone());
                req.values = values.clone();
            }
            PipelineTarget::Script { exec, plan, env } => {
                req.exec = Some(exec.clone());
                req.plan = non_empty(plan);
                req.env = env.clone();
            }
        }
        req
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
