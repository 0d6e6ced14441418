//! Ownership tracking for release dependents: the label identity stamped on
//! every rendered resource, the selectors used to list current and stale
//! generations, and the watch-side filtering that maps dependent changes
//! back to their owning `DaprControlPlane`.

pub mod label_selector;
pub mod labels;
pub mod mapper;
pub mod predicates;
pub mod selectors;
pub mod watch;


pub use labels::{
    RELEASE_GENERATION, RELEASE_NAME, RELEASE_NAMESPACE, ReleaseIdentity,
};
pub use mapper::{ReconcileKey, owner_ref, to_reconcile_key};
pub use predicates::{
    EventPredicate, ObjectEvent, WatchPolicy, admit, dependent_with_labels,
};
pub use selectors::{
    SelectorError, current_selector, release_selector, stale_selector,
};
