use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chore_tracker::config::AppConfig;
use chore_tracker::{create_router, initialize_backend};

const DEFAULT_CONFIG_PATH: &str = "chore-tracker.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHORE_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load_from_path(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    info!("Starting chore tracker (app {})", config.app_id);
    if config.admin_emails.is_empty() {
        info!("No administrator emails configured");
    }

    let app_state = initialize_backend(&config).await?;
    let router = create_router(app_state, &config);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_address))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
