mod config;
mod routes;

use tracing_subscriber::EnvFilter;

use crate::config::HostConfig;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = HostConfig::from_env()?;
    if !config.dist.join("index.html").exists() {
        tracing::warn!("no built app found in {}", config.dist.display());
    }

    let app = routes::app(config.client.clone(), &config.dist);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("server running on http://{}", listener.local_addr()?);
    tracing::info!("remote service at {}", config.client.remote_url);
    axum::serve(listener, app).await?;
    Ok(())
}
