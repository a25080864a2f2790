use hivestats_backend::{config::AppConfig, router, services::hive_rpc::HiveClient, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hivestats_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    tracing::info!(
        "Using Hive API at {} (cache ttl {}s, history window {} days)",
        config.hive_api_url,
        config.cache_ttl_secs,
        config.history_window_days
    );

    let hive = HiveClient::http(config.hive_api_url.clone(), config.rpc_timeout_secs)?;
    let bind_addr = config.bind_addr.clone();
    let app = router(AppState::new(config, hive));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
