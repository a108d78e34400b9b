//! Web server setup and routing

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api;
use crate::config::TlsConfig;
use crate::state::AppState;

/// REST inventory plus the RPC routes for every hosted API
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/resources", get(api::list_resources))
        .route("/api/resources/{name}", delete(api::remove_resource))
        .route("/api/models", get(api::list_models))
        .route("/api/reload", post(api::reload))
        .with_state(state.clone())
        .merge(filament_rpc::router(state.rgb.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Run the web server (HTTP or HTTPS depending on config)
pub async fn run(state: Arc<AppState>, bind: &str, tls: Option<&TlsConfig>) -> Result<()> {
    let app = router(state);

    if let Some(tls_config) = tls {
        run_https(app, bind, tls_config).await
    } else {
        run_http(app, bind).await
    }
}

/// Run plain HTTP server
async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run HTTPS server with TLS
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", bind))?;
    let pem = tls.load().await?;
    info!(address = %addr, protocol = "HTTPS", cert = %tls.cert, "Starting web server");
    axum_server::bind_rustls(addr, pem)
        .serve(app.into_make_service())
        .await
        .with_context(|| format!("HTTPS server on {} failed", addr))
}
