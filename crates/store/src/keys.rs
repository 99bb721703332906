//! Meta key layout shared with the dashboard and connect flows.

use crate::types::NotificationType;

/// Entity kind under which all per-shop keys are scoped.
pub const KIND_SHOP: &str = "shop";

/// Chat workspace authorization blob (JSON [`crate::types::ChatConnection`]).
pub const CHAT_CONNECTION: &str = "slack_authorization_key";

/// Notification preference list (JSON array of
/// [`crate::types::NotificationSetting`]).
pub const NOTIFICATION_SETTINGS: &str = "slack_notification_settings";

/// Low-stock ledger (JSON map, [`crate::types::LowStockLedger`]).
pub const LOW_STOCK_LEDGER: &str = "low_stock_notified";

/// Platform-reported UTC offset such as `-0500`.
pub const TIMEZONE_OFFSET: &str = "timezoneOffset";

/// Platform-provided money rendering template.
pub const MONEY_FORMAT: &str = "moneyFormat";

/// Dedup stamp key for one notification type, e.g. `dailySummary_notified`.
#[must_use]
pub fn notified(notification_type: NotificationType) -> String {
    format!("{}_notified", notification_type.as_key())
}
