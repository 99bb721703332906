//! Signed webhook intake.
//!
//! Verification order: signature, shop, topic. A delivery that fails
//! verification is rejected before any lookup; everything past that point
//! is acknowledged with the platform's expected body, whatever the handler
//! outcome.

use std::sync::Arc;

use {
    axum::{
        Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Json, Response},
        routing::post,
    },
    serde_json::json,
    tracing::{debug, info, warn},
};

use {
    merchbell_store::TenantMeta,
    merchbell_webhooks::{DispatchConfig, WebhookTopic, verify_signature},
};

use crate::state::GatewayState;

const SIGNATURE_HEADER: &str = "X-Shopify-Hmac-SHA256";
const TOPIC_HEADER: &str = "X-Shopify-Topic";
const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

pub fn webhook_router() -> Router<Arc<GatewayState>> {
    Router::new().route("/webhooks/listen", post(listen))
}

async fn listen(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header(&headers, SIGNATURE_HEADER);
    if !verify_signature(&body, signature, &state.shared_secret) {
        warn!("webhook rejected: signature mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid signature" })),
        )
            .into_response();
    }

    let domain = header(&headers, SHOP_DOMAIN_HEADER);
    let tenant = match state.tenants.find_by_domain(domain).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => {
            warn!(domain, "webhook for unknown shop");
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "unknown shop" })),
            )
                .into_response();
        },
        Err(e) => return internal_error(e),
    };

    let raw_topic = header(&headers, TOPIC_HEADER);
    let Some(topic) = WebhookTopic::from_header(raw_topic) else {
        debug!(topic = raw_topic, "ignoring unhandled webhook topic");
        return ack();
    };

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, topic = %topic, "webhook body is not JSON");
            return ack();
        },
    };

    let meta = TenantMeta::new(state.store.as_ref(), &tenant.id);
    let connection = match meta.chat_connection().await {
        Ok(connection) => connection,
        Err(e) => return internal_error(e),
    };
    let settings = match meta.notification_settings().await {
        Ok(settings) => settings,
        Err(e) => return internal_error(e),
    };

    let config = DispatchConfig {
        tenant,
        connection,
        settings,
    };
    let result = state.registry.dispatch(topic, &payload, &config).await;
    match &result.error {
        Some(error) => warn!(topic = %topic, shop = domain, error, "webhook handler failed"),
        None if result.sent => info!(topic = %topic, shop = domain, "notification sent"),
        None => debug!(topic = %topic, shop = domain, "webhook handled, nothing sent"),
    }
    ack()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Ack body the platform expects for a consumed delivery.
fn ack() -> Response {
    Json(json!({ "message": "Success!" })).into_response()
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    warn!(error = %e, "webhook processing failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
        .into_response()
}
