//! Associates API server
//!
//! ```bash
//! associates-server --bind 0.0.0.0:8080 --config associates.toml --log-json
//! ```

use anyhow::Context;
use associates_api::{create_router, init_tracing, AppState, ServerArgs};
use associates_core::{InMemoryRecordStore, RecordStore};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(&args);

    let config = args.core_config().context("loading onboarding config")?;
    tracing::info!(?config, "Loaded onboarding config");

    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let router = create_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!(addr = %args.bind, "Associates API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Associates API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
