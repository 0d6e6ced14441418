#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use dapr_operator::config::OperatorConfig;
use dapr_operator::controller::ReleaseIdentity;
use dapr_operator::crd::dapr_control_plane::{
    DaprControlPlane, DaprControlPlaneSpec,
};
use envconfig::Envconfig;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub fn init() {
    let env: HashMap<String, String> =
        [("DAPR_OPERATOR_LOG".to_string(), "debug".to_string())]
            .into_iter()
            .collect();
    let cfg = OperatorConfig::init_from_hashmap(&env)
        .expect("operator config from test env");
    cfg.init_tracing();
}

pub fn control_plane(
    ns: &str,
    name: &str,
    generation: i64,
) -> DaprControlPlane {
    let spec = DaprControlPlaneSpec { values: None };
    let mut cp = DaprControlPlane::new(name, spec);
    cp.metadata.namespace = Some(ns.to_string());
    cp.metadata.generation = Some(generation);
    cp
}

/// What the renderer would produce for one dependent of `release`.
pub fn rendered_deployment(
    release: &ReleaseIdentity,
    name: &str,
) -> Deployment {
    let mut meta = ObjectMeta {
        name: Some(format!("{}-g{}", name, release.generation)),
        namespace: Some(release.namespace.clone()),
        ..Default::default()
    };
    release.stamp(&mut meta);
    Deployment {
        metadata: meta,
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            ..Default::default()
        }),
        status: Some(DeploymentStatus::default()),
    }
}

pub fn labels_of(d: &Deployment) -> BTreeMap<String, String> {
    d.metadata.labels.clone().unwrap_or_default()
}
