use std::fmt;

use merchbell_store::NotificationType;

/// Webhook topics the integration subscribes to.
///
/// Anything else arriving on the listen endpoint is acknowledged without
/// dispatch; the platform retries unacknowledged deliveries, so an unknown
/// topic must not look like a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookTopic {
    OrderCreated,
    VariantOutOfStock,
}

impl WebhookTopic {
    /// Every topic the integration registers upstream.
    pub const ALL: [WebhookTopic; 2] = [Self::OrderCreated, Self::VariantOutOfStock];

    /// Parse the topic header value.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "orders/create" => Some(Self::OrderCreated),
            "variants/out_of_stock" => Some(Self::VariantOutOfStock),
            _ => None,
        }
    }

    /// Header spelling, as sent by the platform and listed in config.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderCreated => "orders/create",
            Self::VariantOutOfStock => "variants/out_of_stock",
        }
    }

    /// The notification-settings entry that gates this topic.
    #[must_use]
    pub fn notification_type(self) -> NotificationType {
        match self {
            Self::OrderCreated => NotificationType::OrderUpdates,
            Self::VariantOutOfStock => NotificationType::OutOfStockAlerts,
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
