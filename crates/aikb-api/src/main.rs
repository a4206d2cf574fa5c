use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aikb_api::{build_router, config::Config, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting AIKB gateway");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);
    tracing::info!(
        auth_method = %config.upstream.auth.method,
        foundry_configured = config.upstream.foundry.project_endpoint.is_some(),
        search_configured = config.upstream.search.endpoint.is_some(),
        "Upstream settings read"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(
        AppState::new(config).map_err(|e| anyhow::anyhow!("Failed to initialize upstream clients: {}", e))?,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("OpenAPI: http://{}/api/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
