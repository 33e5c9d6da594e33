use anyhow::Context;
use queuemesh_broker::{build_router, BrokerState};
use queuemesh_config::ConfigLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let config = ConfigLoader::new().load_broker().context("failed to load broker configuration")?;

    let state = BrokerState::new(config.node_id.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(node = %config.node_id, bind_addr = %config.bind_addr, "broker listening");

    axum::serve(listener, build_router(state))
        .await
        .context("broker server exited")?;

    Ok(())
}
