use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use review_sentiment::api::{self, AppState};
use review_sentiment::config::Config;
use review_sentiment::pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let analyzer = pipeline::build_analyzer(&config).await?;
    let state = Arc::new(AppState { analyzer });
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
