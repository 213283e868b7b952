use anyhow::Context as _;

use hcm_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hcm_observability::init();

    let config = ApiConfig::from_env()?;
    let bind_addr = config.bind_addr;

    let app = hcm_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
