//! Router assembly and server startup.

use std::sync::Arc;

use {
    axum::{Router, response::Json, routing::get},
    tower_http::trace::TraceLayer,
    tracing::info,
};

use crate::{cron_routes::cron_router, state::GatewayState, webhook_routes::webhook_router};

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(webhook_router())
        .merge(cron_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start(bind: &str, port: u16, state: Arc<GatewayState>) -> std::io::Result<()> {
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
