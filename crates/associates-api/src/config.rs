//! Server configuration and logging bootstrap

use associates_core::CoreConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Associates onboarding API server
#[derive(Debug, Clone, Parser)]
#[command(name = "associates-server", version, about)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "ASSOCIATES_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Path to a TOML file with onboarding settings
    #[arg(long, env = "ASSOCIATES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "ASSOCIATES_LOG_JSON")]
    pub log_json: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "ASSOCIATES_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerArgs {
    /// Onboarding settings from `--config`, or defaults
    pub fn core_config(&self) -> anyhow::Result<CoreConfig> {
        match &self.config {
            Some(path) => Ok(CoreConfig::from_file(path)?),
            None => Ok(CoreConfig::default()),
        }
    }
}

/// Install the global tracing subscriber
pub fn init_tracing(args: &ServerArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
