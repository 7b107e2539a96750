pub mod commands;
pub mod config;
pub mod engines;

pub use config::AppConfig;
pub use engines::EngineRegistry;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `log` records from the SDK are forwarded too.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        log::debug!("logging already initialised");
    }
}
