use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;

pub const RELEASE_NAMESPACE: &str = "operator.dapr.io/release.namespace";
pub const RELEASE_NAME: &str = "operator.dapr.io/release.name";
pub const RELEASE_GENERATION: &str = "operator.dapr.io/release.generation";

/// Plain base-10, no padding. Label selectors compare `<` numerically.
pub fn encode_generation(generation: i64) -> String {
    generation.to_string()
}

pub fn decode_generation(value: &str) -> Option<i64> {
    value.parse().ok()
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("release resource has no namespace")]
    MissingNamespace,
    #[error("release resource has no name")]
    MissingName,
    #[error("release resource {0} has no generation")]
    MissingGeneration(String),
}

/// The owning release of a set of dependents, at one desired-state version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseIdentity {
    pub namespace: String,
    pub name: String,
    pub generation: i64,
}

impl ReleaseIdentity {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        generation: i64,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            generation,
        }
    }

    /// Identity of a top-level resource as currently observed.
    pub fn from_resource<K: Resource>(obj: &K) -> Result<Self, IdentityError> {
        let meta = obj.meta();
        let namespace = meta
            .namespace
            .clone()
            .ok_or(IdentityError::MissingNamespace)?;
        let name = meta.name.clone().ok_or(IdentityError::MissingName)?;
        let generation = meta.generation.ok_or_else(|| {
            IdentityError::MissingGeneration(format!("{}/{}", namespace, name))
        })?;
        Ok(Self {
            namespace,
            name,
            generation,
        })
    }

    /// Read the full identity back off a dependent. Partial label sets and
    /// undecodable generations yield `None`.
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Option<Self> {
        let namespace = labels.get(RELEASE_NAMESPACE)?;
        let name = labels.get(RELEASE_NAME)?;
        let generation = decode_generation(labels.get(RELEASE_GENERATION)?)?;
        Some(Self::new(namespace.as_str(), name.as_str(), generation))
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (RELEASE_NAMESPACE.to_string(), self.namespace.clone()),
            (RELEASE_NAME.to_string(), self.name.clone()),
            (
                RELEASE_GENERATION.to_string(),
                encode_generation(self.generation),
            ),
        ])
    }

    /// Label a freshly rendered dependent. Only for new manifests: a
    /// dependent created under one generation is superseded, not relabeled.
    pub fn stamp(&self, meta: &mut ObjectMeta) {
        meta.labels.get_or_insert_with(BTreeMap::new).extend(self.labels());
    }
}

impl fmt::Display for ReleaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.namespace, self.name, self.generation)
    }
}
