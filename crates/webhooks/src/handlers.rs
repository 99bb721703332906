//! Per-topic event handlers.
//!
//! Each handler resolves the tenant's notification setting for its topic,
//! formats a message, and posts it through the chat client. Handlers never
//! fail the webhook: missing configuration is a skip, and a failed send is
//! reported in the result while the event is still acknowledged upstream.

use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{debug, warn},
};

use {
    merchbell_chat::SlackClient,
    merchbell_commerce::{
        CommerceClient, gid,
        links::{order_link, variant_link},
    },
    merchbell_store::{ChatConnection, NotificationSetting, NotificationType, Tenant},
};

use crate::{
    format::{compose_address, product_list, with_prefix},
    payload::{OrderCreatedPayload, VariantOutOfStockPayload},
    topic::WebhookTopic,
};

/// Everything a handler needs about the tenant an event belongs to.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub tenant: Tenant,
    /// `None` until the tenant completes the chat connect flow.
    pub connection: Option<ChatConnection>,
    pub settings: Vec<NotificationSetting>,
}

impl DispatchConfig {
    /// The setting stored for `ty`, if any.
    #[must_use]
    pub fn setting(&self, ty: NotificationType) -> Option<&NotificationSetting> {
        self.settings.iter().find(|setting| setting.id == ty)
    }

    /// The chat bearer token, `None` when unconnected.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.connection
            .as_ref()
            .map(|conn| conn.access_token.as_str())
            .filter(|token| !token.is_empty())
    }
}

/// Outcome of handling one event.
#[derive(Debug, Clone, Default)]
pub struct HandlerResult {
    /// Whether a chat message went out.
    pub sent: bool,
    /// The formatted message, when one was built.
    pub message: String,
    /// Failure detail; the event is acknowledged regardless.
    pub error: Option<String>,
}

impl HandlerResult {
    /// Handled, but nothing to send (disabled type or no connection).
    #[must_use]
    fn skipped() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(&self, payload: &serde_json::Value, config: &DispatchConfig) -> HandlerResult;
}

/// `orders/create`: summarize the new order into the configured channel.
pub struct OrderCreatedHandler {
    chat: Arc<SlackClient>,
}

impl OrderCreatedHandler {
    pub fn new(chat: Arc<SlackClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl WebhookHandler for OrderCreatedHandler {
    async fn handle(&self, payload: &serde_json::Value, config: &DispatchConfig) -> HandlerResult {
        let payload: OrderCreatedPayload =
            serde_json::from_value(payload.clone()).unwrap_or_default();

        let Some(setting) = config.setting(NotificationType::OrderUpdates) else {
            debug!(tenant = %config.tenant.id, "order updates not configured; skipping");
            return HandlerResult::skipped();
        };
        let Some(channel) = setting.channel_id() else {
            debug!(tenant = %config.tenant.id, "order updates disabled; skipping");
            return HandlerResult::skipped();
        };
        let Some(token) = config.access_token() else {
            debug!(tenant = %config.tenant.id, "no chat connection; skipping");
            return HandlerResult::skipped();
        };

        let body = format!(
            "Customer: {}\nAddress: {}\nProducts: {}\nTotal: {} {}\nView Order: {}",
            payload.shipping_address.name,
            compose_address(&payload.shipping_address),
            product_list(&payload.line_items),
            payload.current_total_price,
            payload.currency,
            order_link(&config.tenant.shop_domain, payload.id),
        );
        let message = with_prefix(setting.message_prefix(), &body);

        match self.chat.send_message(token, channel, &message).await {
            Ok(_) => HandlerResult {
                sent: true,
                message,
                error: None,
            },
            Err(err) => {
                warn!(tenant = %config.tenant.id, error = %err, "order notification failed");
                HandlerResult {
                    sent: false,
                    message,
                    error: Some(err.to_string()),
                }
            },
        }
    }
}

/// `variants/out_of_stock`: look up the variant's titles, then alert the
/// configured channel with a deep link.
pub struct VariantOutOfStockHandler {
    chat: Arc<SlackClient>,
    commerce: Arc<CommerceClient>,
}

impl VariantOutOfStockHandler {
    pub fn new(chat: Arc<SlackClient>, commerce: Arc<CommerceClient>) -> Self {
        Self { chat, commerce }
    }
}

#[async_trait]
impl WebhookHandler for VariantOutOfStockHandler {
    async fn handle(&self, payload: &serde_json::Value, config: &DispatchConfig) -> HandlerResult {
        let payload: VariantOutOfStockPayload =
            serde_json::from_value(payload.clone()).unwrap_or_default();

        let Some(setting) = config.setting(NotificationType::OutOfStockAlerts) else {
            debug!(tenant = %config.tenant.id, "out-of-stock alerts not configured; skipping");
            return HandlerResult::skipped();
        };
        let Some(channel) = setting.channel_id() else {
            debug!(tenant = %config.tenant.id, "out-of-stock alerts disabled; skipping");
            return HandlerResult::skipped();
        };
        let Some(token) = config.access_token() else {
            debug!(tenant = %config.tenant.id, "no chat connection; skipping");
            return HandlerResult::skipped();
        };

        let ids = vec![gid::variant(&payload.id.to_string())];
        let variants = match self
            .commerce
            .variants_by_ids(&config.tenant.shop_domain, &config.tenant.access_token, &ids)
            .await
        {
            Ok(variants) => variants,
            Err(err) => {
                warn!(tenant = %config.tenant.id, error = %err, "variant lookup failed");
                return HandlerResult {
                    sent: false,
                    message: String::new(),
                    error: Some(err.to_string()),
                };
            },
        };
        let Some(variant) = variants.into_iter().next() else {
            warn!(tenant = %config.tenant.id, variant = payload.id, "variant not found");
            return HandlerResult {
                sent: false,
                message: String::new(),
                error: Some(format!("variant {} not found", payload.id)),
            };
        };

        let link = variant_link(
            &config.tenant.shop_domain,
            gid::numeric(&variant.product.id),
            gid::numeric(&variant.id),
        );
        let body = format!(
            "Product: {}\nVariant: {}\n{link}",
            variant.product.title, variant.title
        );
        let message = with_prefix(setting.message_prefix(), &body);

        match self.chat.send_message(token, channel, &message).await {
            Ok(_) => HandlerResult {
                sent: true,
                message,
                error: None,
            },
            Err(err) => {
                warn!(tenant = %config.tenant.id, error = %err, "out-of-stock notification failed");
                HandlerResult {
                    sent: false,
                    message,
                    error: Some(err.to_string()),
                }
            },
        }
    }
}

/// Static topic → handler table.
pub struct HandlerRegistry {
    order_created: OrderCreatedHandler,
    variant_out_of_stock: VariantOutOfStockHandler,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new(chat: Arc<SlackClient>, commerce: Arc<CommerceClient>) -> Self {
        Self {
            order_created: OrderCreatedHandler::new(Arc::clone(&chat)),
            variant_out_of_stock: VariantOutOfStockHandler::new(chat, commerce),
        }
    }

    #[must_use]
    pub fn handler(&self, topic: WebhookTopic) -> &dyn WebhookHandler {
        match topic {
            WebhookTopic::OrderCreated => &self.order_created,
            WebhookTopic::VariantOutOfStock => &self.variant_out_of_stock,
        }
    }

    /// Run the handler registered for `topic`.
    pub async fn dispatch(
        &self,
        topic: WebhookTopic,
        payload: &serde_json::Value,
        config: &DispatchConfig,
    ) -> HandlerResult {
        self.handler(topic).handle(payload, config).await
    }
}
