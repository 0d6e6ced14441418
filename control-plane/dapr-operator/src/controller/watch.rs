//! Bridges `kube::runtime::watcher` streams to the dependent predicate.
//!
//! The watcher reports `Apply`/`Delete` and relist markers but never a
//! before/after pair, so [`DependentTracker`] keeps the last copy of every
//! release-owned dependent it has seen and synthesises create, update and
//! delete events from that. Objects without ownership labels are never
//! remembered; one that gains them later arrives as a create. One tracker
//! belongs to one watch stream.

use std::collections::{HashMap, HashSet};

use futures_util::{Stream, StreamExt, future, stream};
use kube::{Resource, ResourceExt, runtime::watcher};
use tracing::{debug, trace, warn};

use super::mapper::{ReconcileKey, labels_to_key, to_reconcile_key};
use super::predicates::{EventPredicate, ObjectEvent};

pub struct DependentTracker<K, P> {
    predicate: P,
    seen: HashMap<String, K>,
    relisted: Option<HashSet<String>>,
}

impl<K, P> DependentTracker<K, P>
where
    K: Resource,
    P: EventPredicate<K>,
{
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            seen: HashMap::new(),
            relisted: None,
        }
    }

    /// Number of dependents currently remembered.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Feed one watcher event; returns the owner keys to reconcile.
    pub fn handle(&mut self, event: watcher::Event<K>) -> Vec<ReconcileKey> {
        match event {
            watcher::Event::Init => {
                self.relisted = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(obj) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(object_key(&obj));
                }
                self.apply(obj).into_iter().collect()
            }
            watcher::Event::InitDone => self.finish_relist(),
            watcher::Event::Apply(obj) => {
                self.apply(obj).into_iter().collect()
            }
            watcher::Event::Delete(obj) => {
                self.seen.remove(&object_key(&obj));
                self.admit(&ObjectEvent::Delete(&obj)).into_iter().collect()
            }
        }
    }

    fn apply(&mut self, obj: K) -> Option<ReconcileKey> {
        let key = object_key(&obj);
        let out = match self.seen.get(&key) {
            Some(old) => self.admit(&ObjectEvent::Update { old, new: &obj }),
            None => self.admit(&ObjectEvent::Create(&obj)),
        };
        if labels_to_key(obj.meta().labels.as_ref()).is_some() {
            self.seen.insert(key, obj);
        } else {
            self.seen.remove(&key);
        }
        out
    }

    // Anything remembered but absent from the relist was deleted while the
    // watch was down.
    fn finish_relist(&mut self) -> Vec<ReconcileKey> {
        let Some(relisted) = self.relisted.take() else {
            return Vec::new();
        };
        let gone: Vec<String> = self
            .seen
            .keys()
            .filter(|k| !relisted.contains(*k))
            .cloned()
            .collect();
        if !gone.is_empty() {
            debug!(count = gone.len(), "relist dropped dependents");
        }
        let removed: Vec<K> = gone
            .iter()
            .filter_map(|k| self.seen.remove(k))
            .collect();
        removed
            .iter()
            .filter_map(|obj| self.admit(&ObjectEvent::Delete(obj)))
            .collect()
    }

    fn admit(&self, event: &ObjectEvent<'_, K>) -> Option<ReconcileKey> {
        if !self.predicate.decide(event) {
            return None;
        }
        let key = to_reconcile_key(event.object())?;
        trace!(kind = %event.kind(), owner = %key, "admitted dependent event");
        Some(key)
    }
}

fn object_key<K: Resource>(obj: &K) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Owner keys for every admitted event on a dependent watch stream.
/// Watcher errors are logged and skipped; the watcher retries on its own
/// when wrapped in a backoff.
pub fn owner_keys<K, P, S>(
    events: S,
    predicate: P,
) -> impl Stream<Item = ReconcileKey>
where
    K: Resource,
    P: EventPredicate<K>,
    S: Stream<Item = Result<watcher::Event<K>, watcher::Error>>,
{
    let mut tracker = DependentTracker::new(predicate);
    events
        .filter_map(|res| {
            future::ready(match res {
                Ok(event) => Some(event),
                Err(error) => {
                    warn!(%error, "dependent watch error");
                    None
                }
            })
        })
        .flat_map(move |event| stream::iter(tracker.handle(event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::labels::ReleaseIdentity;
    use crate::controller::predicates::{
        And, WatchPolicy, dependent_with_labels,
    };
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn owned(name: &str, owner: &str) -> ConfigMap {
        let mut meta = ObjectMeta {
            name: Some(name.into()),
            namespace: Some("dapr-system".into()),
            ..Default::default()
        };
        ReleaseIdentity::new("dapr-system", owner, 1).stamp(&mut meta);
        ConfigMap {
            metadata: meta,
            ..Default::default()
        }
    }

    fn tracker(
        policy: WatchPolicy,
    ) -> DependentTracker<ConfigMap, And<ConfigMap>> {
        DependentTracker::new(dependent_with_labels::<ConfigMap>(policy))
    }

    fn all_kinds() -> WatchPolicy {
        WatchPolicy {
            watch_update: true,
            watch_delete: true,
            watch_status: false,
        }
    }

    #[test]
    fn first_apply_is_create_and_later_apply_is_update() {
        let mut t = tracker(WatchPolicy::default());
        let cm = owned("a", "dapr");
        assert_eq!(
            t.handle(watcher::Event::Apply(cm.clone())),
            vec![ReconcileKey::new("dapr-system", "dapr")]
        );
        // Updates not watched: second sighting is an update and is dropped.
        assert!(t.handle(watcher::Event::Apply(cm)).is_empty());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn delete_forgets_object() {
        let mut t = tracker(all_kinds());
        let cm = owned("a", "dapr");
        t.handle(watcher::Event::Apply(cm.clone()));
        assert_eq!(t.handle(watcher::Event::Delete(cm.clone())).len(), 1);
        assert!(t.is_empty());
        // Back again after deletion: a create, admitted without watch_update.
        let mut t = tracker(WatchPolicy::default());
        t.handle(watcher::Event::Apply(cm.clone()));
        assert!(t.handle(watcher::Event::Delete(cm.clone())).is_empty());
        assert_eq!(t.handle(watcher::Event::Apply(cm)).len(), 1);
    }

    #[test]
    fn relist_reports_vanished_objects_as_deletes() {
        let mut t = tracker(all_kinds());
        t.handle(watcher::Event::Apply(owned("a", "first")));
        t.handle(watcher::Event::Apply(owned("b", "second")));

        assert!(t.handle(watcher::Event::Init).is_empty());
        assert_eq!(
            t.handle(watcher::Event::InitApply(owned("a", "first"))),
            vec![ReconcileKey::new("dapr-system", "first")]
        );
        assert_eq!(
            t.handle(watcher::Event::InitDone),
            vec![ReconcileKey::new("dapr-system", "second")]
        );
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn unowned_objects_are_never_remembered() {
        let mut t = tracker(WatchPolicy::default());
        for i in 0..100 {
            let mut cm = owned(&format!("cm-{i}"), "dapr");
            cm.metadata.labels = if i % 2 == 0 {
                None
            } else {
                Some(BTreeMap::new())
            };
            assert!(t.handle(watcher::Event::Apply(cm)).is_empty());
        }
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn stripping_owner_labels_forgets_object() {
        let mut t = tracker(all_kinds());
        let cm = owned("a", "dapr");
        t.handle(watcher::Event::Apply(cm.clone()));
        assert_eq!(t.len(), 1);

        let mut stripped = cm.clone();
        stripped.metadata.labels = Some(BTreeMap::new());
        assert!(t.handle(watcher::Event::Apply(stripped.clone())).is_empty());
        assert!(t.is_empty());
        assert!(t.handle(watcher::Event::Delete(stripped)).is_empty());

        // Relabeled later: seen fresh, so it is a create.
        let mut t = tracker(WatchPolicy::default());
        let mut bare = cm.clone();
        bare.metadata.labels = None;
        t.handle(watcher::Event::Apply(bare));
        assert_eq!(
            t.handle(watcher::Event::Apply(cm)),
            vec![ReconcileKey::new("dapr-system", "dapr")]
        );
    }

    #[tokio::test]
    async fn owner_keys_skips_watch_errors() {
        let events = stream::iter(vec![
            Ok(watcher::Event::Apply(owned("a", "dapr"))),
            Err(watcher::Error::NoResourceVersion),
            Ok(watcher::Event::Apply(owned("b", "other"))),
        ]);
        let keys: Vec<ReconcileKey> =
            owner_keys(events, dependent_with_labels::<ConfigMap>(all_kinds()))
                .collect()
                .await;
        assert_eq!(
            keys,
            vec![
                ReconcileKey::new("dapr-system", "dapr"),
                ReconcileKey::new("dapr-system", "other"),
            ]
        );
    }
}
