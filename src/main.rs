//! aggregator-gateway server entry point.
//!
//! Starts the Axum HTTP server that proxies the aggregation API for a local
//! swap UI.

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use aggregator_gateway::api;
use aggregator_gateway::app_state::AppState;
use aggregator_gateway::client::GatewayClient;
use aggregator_gateway::config::GatewayConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        chain_id = config.client.chain_id,
        "starting aggregator-gateway"
    );

    // Build client
    let client = GatewayClient::new(config.client)?;
    let app_state = AppState::new(client);

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(api::cors_layer(&config.cors_origin)?)
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
