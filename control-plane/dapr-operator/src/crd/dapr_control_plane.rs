use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level release resource. Every dependent rendered for it carries the
/// ownership labels from `controller::labels`.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "operator.dapr.io",
    version = "v1alpha1",
    kind = "DaprControlPlane",
    plural = "daprcontrolplanes",
    namespaced,
    status = "DaprControlPlaneStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DaprControlPlaneSpec {
    /// Chart values handed to the renderer as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaprControlPlaneStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Generation whose dependents were last applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}
