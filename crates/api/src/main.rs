use anyhow::Context as _;

use scopegate_infra::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scopegate_observability::init();

    let config = EngineConfig::from_env().context("loading configuration")?;
    let app = scopegate_api::app::build_app_from_config(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
