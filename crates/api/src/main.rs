use anyhow::{Context, Result};
use tripwise_api::{build_app, ApiConfig};
use tripwise_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("tripwise_api");

    let config = ApiConfig::from_env();
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        provider = %config.catalog.base_url,
        "tripwise api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
