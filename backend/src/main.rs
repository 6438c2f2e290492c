use backend::config::Config;
use backend::AppState;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    if config.api_token.is_none() {
        warn!("API_TOKEN is not set; all admin endpoints will reject requests");
    }
    if !config.content_dir.is_dir() {
        warn!(content_dir = %config.content_dir.display(), "content directory does not exist yet");
    }

    let addr = config.bind_addr;
    info!(
        content_dir = %config.content_dir.display(),
        default_group = %config.default_group,
        "starting content server"
    );
    let state = Arc::new(AppState::new(config));
    let app = backend::app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
