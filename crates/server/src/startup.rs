use std::{env, net::SocketAddr, time::Duration};

use axum::Router;
use common::utils::logging::init_logging_default;
use common::UpstreamClient;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};

fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from the config, with env-var overrides for deployments.
fn load_bind_addr(cfg: &configs::ServerConfig) -> anyhow::Result<SocketAddr> {
    let host = env::var("SERVER_HOST").unwrap_or_else(|_| cfg.host.clone());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(cfg.port);
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()
        .map_err(|e| crate::errors::StartupError::InvalidConfig(e.to_string()))?;

    let upstream = UpstreamClient::new(
        &cfg.upstream.base_url,
        Duration::from_secs(cfg.upstream.timeout_secs),
    )?;
    info!(base_url = %upstream.base_url(), timeout_secs = cfg.upstream.timeout_secs, "upstream client ready");

    let state = ServerState { upstream, user_id: cfg.upstream.user_id.clone() };

    let cors = build_cors();
    let app: Router = routes::build_router(state, cors);

    let addr = load_bind_addr(&cfg.server)?;
    info!(%addr, "starting debt-sheet BFF");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
