//! Admission filters for change notifications on release dependents.
//!
//! Each gate is its own [`EventPredicate`]; [`dependent_with_labels`]
//! composes the ownership, kind and status gates with [`And`]. The gates
//! are independent, so their order inside an `And` does not change the
//! decision.

use std::fmt;

use kube::Resource;
use serde::Serialize;
use serde_json::Value;
use tracing::{trace, warn};

use super::labels::{RELEASE_NAME, RELEASE_NAMESPACE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Update,
    Delete,
    Generic,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Create => write!(f, "create"),
            EventKind::Update => write!(f, "update"),
            EventKind::Delete => write!(f, "delete"),
            EventKind::Generic => write!(f, "generic"),
        }
    }
}

/// A change notification for one watched object.
#[derive(Debug)]
pub enum ObjectEvent<'a, K> {
    Create(&'a K),
    Update { old: &'a K, new: &'a K },
    /// Carries the last known state of the object.
    Delete(&'a K),
    Generic(&'a K),
}

impl<K> Clone for ObjectEvent<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for ObjectEvent<'_, K> {}

impl<'a, K> ObjectEvent<'a, K> {
    pub fn kind(&self) -> EventKind {
        match self {
            ObjectEvent::Create(_) => EventKind::Create,
            ObjectEvent::Update { .. } => EventKind::Update,
            ObjectEvent::Delete(_) => EventKind::Delete,
            ObjectEvent::Generic(_) => EventKind::Generic,
        }
    }

    /// The state the event leaves the object in: the new object for
    /// updates, the last known one for deletes.
    pub fn object(&self) -> &'a K {
        match *self {
            ObjectEvent::Create(obj)
            | ObjectEvent::Delete(obj)
            | ObjectEvent::Generic(obj) => obj,
            ObjectEvent::Update { new, .. } => new,
        }
    }
}

pub trait EventPredicate<K> {
    fn decide(&self, event: &ObjectEvent<'_, K>) -> bool;
}

/// Ownership gate: the object carries `name` with a non-empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasLabel {
    pub name: &'static str,
}

impl<K: Resource> EventPredicate<K> for HasLabel {
    fn decide(&self, event: &ObjectEvent<'_, K>) -> bool {
        let found = event
            .object()
            .meta()
            .labels
            .as_ref()
            .and_then(|l| l.get(self.name))
            .is_some_and(|v| !v.is_empty());
        if !found {
            trace!(
                kind = %event.kind(),
                label = self.name,
                "rejected: missing ownership label"
            );
        }
        found
    }
}

/// Kind gate: creates and generic events always pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindFilter {
    pub watch_update: bool,
    pub watch_delete: bool,
}

impl<K> EventPredicate<K> for KindFilter {
    fn decide(&self, event: &ObjectEvent<'_, K>) -> bool {
        let admitted = match event.kind() {
            EventKind::Create | EventKind::Generic => true,
            EventKind::Update => self.watch_update,
            EventKind::Delete => self.watch_delete,
        };
        if !admitted {
            trace!(kind = %event.kind(), "rejected: event kind not watched");
        }
        admitted
    }
}

/// Status gate: with `watch_status`, updates pass only when the object's
/// `status` differs between old and new. Other kinds always pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFilter {
    pub watch_status: bool,
}

impl<K: Serialize> EventPredicate<K> for StatusFilter {
    fn decide(&self, event: &ObjectEvent<'_, K>) -> bool {
        let ObjectEvent::Update { old, new } = event else {
            return true;
        };
        if !self.watch_status {
            return true;
        }
        let changed = status_of(*old) != status_of(*new);
        if !changed {
            trace!(kind = %event.kind(), "rejected: status unchanged");
        }
        changed
    }
}

fn status_of<K: Serialize>(obj: &K) -> Option<Value> {
    match serde_json::to_value(obj) {
        Ok(Value::Object(mut map)) => map.remove("status"),
        Ok(_) => None,
        Err(error) => {
            warn!(%error, "cannot serialize object to compare status");
            None
        }
    }
}

/// Conjunction of predicates. An empty `And` admits everything.
pub struct And<K> {
    predicates: Vec<Box<dyn EventPredicate<K> + Send + Sync>>,
}

impl<K> And<K> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    pub fn with<P>(mut self, predicate: P) -> Self
    where
        P: EventPredicate<K> + Send + Sync + 'static,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<K> Default for And<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for And<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("And").field("len", &self.len()).finish()
    }
}

impl<K> EventPredicate<K> for And<K> {
    fn decide(&self, event: &ObjectEvent<'_, K>) -> bool {
        self.predicates.iter().all(|p| p.decide(event))
    }
}

/// Switches for the non-create event kinds on a dependent watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchPolicy {
    pub watch_update: bool,
    pub watch_delete: bool,
    /// Narrows admitted updates to status changes; never widens.
    pub watch_status: bool,
}

impl WatchPolicy {
    pub fn kind_filter(&self) -> KindFilter {
        KindFilter {
            watch_update: self.watch_update,
            watch_delete: self.watch_delete,
        }
    }

    pub fn status_filter(&self) -> StatusFilter {
        StatusFilter {
            watch_status: self.watch_status,
        }
    }
}

/// The admission predicate for a watched dependent kind.
pub fn dependent_with_labels<K>(policy: WatchPolicy) -> And<K>
where
    K: Resource + Serialize + 'static,
{
    And::new()
        .with(HasLabel { name: RELEASE_NAME })
        .with(HasLabel {
            name: RELEASE_NAMESPACE,
        })
        .with(policy.kind_filter())
        .with(policy.status_filter())
}

pub fn admit<K>(event: &ObjectEvent<'_, K>, policy: WatchPolicy) -> bool
where
    K: Resource + Serialize + 'static,
{
    dependent_with_labels::<K>(policy).decide(event)
}
