use dapr_operator::crd::dapr_control_plane::DaprControlPlane;
use kube::core::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = DaprControlPlane::crd();
    let yaml = serde_yaml::to_string(&crd)?;
    println!("{}", yaml);
    Ok(())
}
