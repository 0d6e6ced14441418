use envconfig::Envconfig;

use crate::controller::predicates::WatchPolicy;

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    /// Default tracing directive when RUST_LOG is unset.
    /// Env: DAPR_OPERATOR_LOG
    #[envconfig(from = "DAPR_OPERATOR_LOG", default = "info")]
    pub log: String,

    #[envconfig(nested)]
    pub watch: WatchConfig,
}

/// Which change notifications on dependents may trigger a reconcile of
/// their owning release. Create and generic events always do.
#[derive(Envconfig, Clone, Debug)]
pub struct WatchConfig {
    #[envconfig(from = "DAPR_OPERATOR_WATCH_UPDATE", default = "true")]
    pub update: bool,
    #[envconfig(from = "DAPR_OPERATOR_WATCH_DELETE", default = "true")]
    pub delete: bool,
    /// Narrow admitted updates to those that changed the dependent's status.
    /// Env: DAPR_OPERATOR_WATCH_STATUS
    #[envconfig(from = "DAPR_OPERATOR_WATCH_STATUS", default = "false")]
    pub status: bool,
}

impl OperatorConfig {
    /// Install the global subscriber with `log` as the default directive.
    pub fn init_tracing(&self) {
        crate::init_tracing(&self.log);
    }
}

impl WatchConfig {
    pub fn policy(&self) -> WatchPolicy {
        WatchPolicy {
            watch_update: self.update,
            watch_delete: self.delete,
            watch_status: self.status,
        }
    }
}
