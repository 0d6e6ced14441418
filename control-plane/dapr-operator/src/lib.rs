pub mod config;
pub mod controller;
pub mod crd;

use tracing_subscriber::{
    EnvFilter,
    filter::{Directive, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// `default_env` parsed as a filter directive, `info` when it does not parse.
pub fn default_directive(default_env: &str) -> Directive {
    default_env
        .parse::<Directive>()
        .unwrap_or_else(|_| LevelFilter::INFO.into())
}

pub fn init_tracing(default_env: &str) {
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .with_default_directive(default_directive(default_env))
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
