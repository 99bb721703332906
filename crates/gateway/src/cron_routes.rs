//! Cron-facing scheduler triggers.
//!
//! An external timer posts here on a fixed interval; each call consumes at
//! most one eligible tenant and reports which ids were processed.

use std::sync::Arc;

use {
    axum::{
        Router,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Json, Response},
        routing::post,
    },
    serde_json::json,
    tracing::error,
};

use merchbell_digest::DigestKind;

use crate::state::GatewayState;

pub fn cron_router() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/cron/low-stock", post(low_stock))
        .route("/cron/daily-summary", post(daily_summary))
}

async fn low_stock(State(state): State<Arc<GatewayState>>) -> Response {
    run_digest(&state, DigestKind::LowStock).await
}

async fn daily_summary(State(state): State<Arc<GatewayState>>) -> Response {
    run_digest(&state, DigestKind::DailySummary).await
}

async fn run_digest(state: &GatewayState, kind: DigestKind) -> Response {
    match state.scheduler.run(kind).await {
        Ok(processed) => Json(json!({ "processed": processed })).into_response(),
        Err(e) => {
            error!(error = %e, kind = ?kind, "digest run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        },
    }
}
