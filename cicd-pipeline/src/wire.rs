//! JSON bodies exchanged with the control plane.
//!
//! - `POST /api/pipelines/activate`: [`ActivationRequest`] → [`ActivationResponse`]
//! - `POST /api/pipelines/deactivate`: [`DeactivationRequest`] → ignored body

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cicd_core::types::PipelineKind;

/// Activation path, relative to the API root.
pub const ACTIVATE_PATH: &str = "/api/pipelines/activate";
/// Deactivation path, relative to the API root.
pub const DEACTIVATE_PATH: &str = "/api/pipelines/deactivate";

/// Create-or-refresh request body.
///
/// `branches` and `approvers` are always sent, empty or not; other optional
/// fields are omitted when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub id: String,
    /// Present only when refreshing an activated pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(rename = "type")]
    pub kind: PipelineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_provider: Option<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
    #[serde(rename = "approvesrequired", default)]
    pub approvals_required: u32,
}

/// Activation response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResponse {
    pub id: String,
    #[serde(default)]
    pub secret: Option<String>,
}

/// Deactivation request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationRequest {
    pub id: String,
    pub secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(kind: PipelineKind) -> ActivationRequest {
        ActivationRequest {
            id: "abc".into(),
            secret: None,
            kind,
            origin: None,
            registry_url: None,
            registry_provider: None,
            branches: vec![],
            approvers: vec![],
            archive: None,
            release: None,
            namespace: None,
            exec: None,
            plan: None,
            env: BTreeMap::new(),
            values: BTreeMap::new(),
            approvals_required: 0,
        }
    }

    #[test]
    fn minimal_request_shape() {
        let value = serde_json::to_value(minimal(PipelineKind::Script)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "abc",
                "type": "script",
                "branches": [],
                "approvers": [],
                "approvesrequired": 0
            })
        );
    }

    #[test]
    fn refresh_request_carries_secret_and_lists_in_order() {
        let mut req = minimal(PipelineKind::Helm);
        req.secret = Some("s".into());
        req.archive = Some("helm/demo-0123456789ab.zip".into());
        req.branches = vec!["main".into(), "release/*".into()];
        req.approvals_required = 2;

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["secret"], "s");
        assert_eq!(value["type"], "helm");
        assert_eq!(value["archive"], "helm/demo-0123456789ab.zip");
        assert_eq!(value["branches"], json!(["main", "release/*"]));
        assert_eq!(value["approvesrequired"], 2);
    }

    #[test]
    fn response_secret_is_optional() {
        let with: ActivationResponse =
            serde_json::from_str(r#"{"id":"a","secret":"s"}"#).unwrap();
        assert_eq!(with.secret.as_deref(), Some("s"));

        let without: ActivationResponse = serde_json::from_str(r#"{"id":"a"}"#).unwrap();
        assert!(without.secret.is_none());
    }

    #[test]
    fn response_ignores_extra_fields() {
        let resp: ActivationResponse =
            serde_json::from_str(r#"{"id":"a","secret":"s","created":true}"#).unwrap();
        assert_eq!(resp.id, "a");
    }
}
