use anyhow::Context;
use queuemesh_config::ConfigLoader;
use queuemesh_coordinator::{build_router, CoordinatorState};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let config = ConfigLoader::new()
        .load_coordinator()
        .context("failed to load coordinator configuration")?;
    let bind_addr = config.bind_addr;

    let state = CoordinatorState::new(config);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    state.health.clone().spawn(events_tx);
    tokio::spawn(state.failover.clone().run(state.health.clone(), events_rx));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "coordinator listening");

    axum::serve(listener, build_router(state))
        .await
        .context("coordinator server exited")?;

    Ok(())
}
