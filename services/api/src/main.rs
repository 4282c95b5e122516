use portal_api::{app, ApiConfig, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    domain::payloads::validate_all()?;

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Portal API listening on {}", listener.local_addr()?);

    axum::serve(listener, app(AppState::new(config))).await?;
    Ok(())
}
