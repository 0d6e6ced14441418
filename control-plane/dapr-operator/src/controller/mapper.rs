use std::collections::BTreeMap;
use std::fmt;

use kube::Resource;
use kube::runtime::reflector::ObjectRef;
use tracing::trace;

use super::labels::{RELEASE_NAME, RELEASE_NAMESPACE};
use crate::crd::dapr_control_plane::DaprControlPlane;

/// Namespace and name of the release resource to reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReconcileKey {
    pub namespace: String,
    pub name: String,
}

impl ReconcileKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn object_ref(&self) -> ObjectRef<DaprControlPlane> {
        ObjectRef::new(&self.name).within(&self.namespace)
    }
}

impl fmt::Display for ReconcileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Owner key from a dependent's labels. Absent or empty release name or
/// namespace yields no key.
pub fn labels_to_key(
    labels: Option<&BTreeMap<String, String>>,
) -> Option<ReconcileKey> {
    let labels = labels?;
    let name = labels.get(RELEASE_NAME).filter(|v| !v.is_empty())?;
    let namespace = labels.get(RELEASE_NAMESPACE).filter(|v| !v.is_empty())?;
    Some(ReconcileKey::new(namespace.as_str(), name.as_str()))
}

pub fn to_reconcile_key<K: Resource>(obj: &K) -> Option<ReconcileKey> {
    let key = labels_to_key(obj.meta().labels.as_ref());
    if key.is_none() {
        trace!(
            ns = obj.meta().namespace.as_deref().unwrap_or_default(),
            name = obj.meta().name.as_deref().unwrap_or_default(),
            "dropped: no release owner labels"
        );
    }
    key
}

/// Mapper shaped for `Controller::watches`.
pub fn owner_ref<K: Resource>(obj: K) -> Option<ObjectRef<DaprControlPlane>> {
    to_reconcile_key(&obj).map(|k| k.object_ref())
}
