mod common;

use common::{control_plane, labels_of, rendered_deployment};
use dapr_operator::controller::{
    ReleaseIdentity, current_selector, release_selector, stale_selector,
};
use k8s_openapi::api::apps::v1::Deployment;

const COMPONENTS: [&str; 3] =
    ["dapr-operator", "dapr-sentry", "dapr-placement"];

fn render_all(release: &ReleaseIdentity) -> Vec<Deployment> {
    COMPONENTS
        .iter()
        .map(|c| rendered_deployment(release, c))
        .collect()
}

fn names(list: &[&Deployment]) -> Vec<String> {
    let mut out: Vec<String> = list
        .iter()
        .filter_map(|d| d.metadata.name.clone())
        .collect();
    out.sort();
    out
}

#[test]
fn generation_bump_marks_previous_render_stale() {
    common::init();

    // Two renders of the same release plus an unrelated release that raced
    // alongside it in the same namespace.
    let observed = |generation| {
        ReleaseIdentity::from_resource(&control_plane(
            "dapr-system",
            "dapr",
            generation,
        ))
        .unwrap()
    };
    let v1 = observed(1);
    let v9 = observed(9);
    let v10 = observed(10);
    let other = ReleaseIdentity::new("dapr-system", "dapr-canary", 1);

    let mut cluster = Vec::new();
    cluster.extend(render_all(&v1));
    cluster.extend(render_all(&v9));
    cluster.extend(render_all(&v10));
    cluster.extend(render_all(&other));

    let stale = stale_selector(&v10).unwrap();
    let current = current_selector(&v10).unwrap();

    let gc: Vec<&Deployment> = cluster
        .iter()
        .filter(|d| stale.matches(&labels_of(d)))
        .collect();
    let live: Vec<&Deployment> = cluster
        .iter()
        .filter(|d| current.matches(&labels_of(d)))
        .collect();

    assert_eq!(gc.len(), 6);
    assert!(gc.iter().all(|d| {
        let id = ReleaseIdentity::from_labels(&labels_of(d)).unwrap();
        id.name == "dapr" && id.generation < 10
    }));
    assert_eq!(
        names(&live),
        vec!["dapr-operator-g10", "dapr-placement-g10", "dapr-sentry-g10"]
    );

    // Current and stale never overlap.
    assert!(gc.iter().all(|d| !current.matches(&labels_of(d))));
}

#[test]
fn release_selector_spans_every_release() {
    let a = ReleaseIdentity::new("ns-a", "one", 3);
    let b = ReleaseIdentity::new("ns-b", "two", 1);
    let mut cluster = render_all(&a);
    cluster.extend(render_all(&b));
    let mut stray = rendered_deployment(&a, "stray");
    stray.metadata.labels = None;
    cluster.push(stray);

    let any = release_selector().unwrap();
    let owned = cluster.iter().filter(|d| any.matches(&labels_of(d))).count();
    assert_eq!(owned, 6);
}

#[test]
fn selectors_render_list_params() {
    let release = ReleaseIdentity::new("dapr-system", "dapr", 4);
    let lp = stale_selector(&release).unwrap().list_params();
    let selector = lp.label_selector.unwrap();
    assert!(selector.contains("operator.dapr.io/release.generation<4"));
    assert!(selector.contains("operator.dapr.io/release.name=dapr"));
    assert!(
        selector.contains("operator.dapr.io/release.namespace=dapr-system")
    );
}
