//! Tenant and per-tenant metadata models.

use std::collections::HashMap;

use {
    chrono::NaiveDate,
    serde::{Deserialize, Serialize},
};

use crate::error::{Error, Result};

/// One connected commerce store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    /// Fully qualified shop domain, e.g. `acme.myshopify.com`.
    pub shop_domain: String,
    /// Admin API access token issued at install time.
    pub access_token: String,
}

/// Chat workspace authorization for a tenant.
///
/// Wire shape (written by the connect flow):
/// `{"access_token": "...", "team": {"name": "..."}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConnection {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub team: Team,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub name: String,
}

/// Notification categories a tenant can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    OrderUpdates,
    LowStockAlerts,
    OutOfStockAlerts,
    DailySummary,
}

impl NotificationType {
    /// Stable key used in stored settings ids and dedup stamp keys.
    #[must_use]
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::OrderUpdates => "orderUpdates",
            Self::LowStockAlerts => "lowStockAlerts",
            Self::OutOfStockAlerts => "outOfStockAlerts",
            Self::DailySummary => "dailySummary",
        }
    }
}

/// Target channel reference: `{"value": "C123", "label": "#general"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

/// One per-type notification preference.
///
/// An absent or empty channel means the type is disabled, not defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSetting {
    pub id: NotificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelRef>,
}

impl NotificationSetting {
    /// The configured channel id, `None` when the setting is disabled.
    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        self.channel
            .as_ref()
            .map(|c| c.value.as_str())
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.channel_id().is_some()
    }

    /// The custom message prefix, empty string when unset.
    #[must_use]
    pub fn message_prefix(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

/// Decode a stored settings blob, enforcing at most one entry per type.
pub fn decode_settings(raw: &str) -> Result<Vec<NotificationSetting>> {
    let settings: Vec<NotificationSetting> = serde_json::from_str(raw)?;
    let mut seen = Vec::with_capacity(settings.len());
    for setting in &settings {
        if seen.contains(&setting.id) {
            return Err(Error::duplicate_setting(setting.id.as_key()));
        }
        seen.push(setting.id);
    }
    Ok(settings)
}

/// Which variants have already been flagged low, and when.
///
/// Wire shape: `{"<productId>": {"<variantId>": "2024-05-01"}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LowStockLedger {
    entries: HashMap<String, HashMap<String, String>>,
}

impl LowStockLedger {
    /// The date this variant was last flagged, if recorded and parseable.
    #[must_use]
    pub fn last_notified(&self, product_id: &str, variant_id: &str) -> Option<NaiveDate> {
        let raw = self.entries.get(product_id)?.get(variant_id)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Whether this variant should be reported again: never recorded, or the
    /// recorded date predates `window_start`.
    #[must_use]
    pub fn should_notify(
        &self,
        product_id: &str,
        variant_id: &str,
        window_start: NaiveDate,
    ) -> bool {
        match self.last_notified(product_id, variant_id) {
            Some(date) => date < window_start,
            None => true,
        }
    }

    pub fn record(&mut self, product_id: &str, variant_id: &str, date: NaiveDate) {
        self.entries
            .entry(product_id.to_string())
            .or_default()
            .insert(variant_id.to_string(), date.format("%Y-%m-%d").to_string());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_settings_blob() {
        let raw = r##"[
            {"id": "orderUpdates", "message": "New order!", "channel": {"value": "C1", "label": "#orders"}},
            {"id": "dailySummary", "channel": {"value": "", "label": ""}}
        ]"##;
        let settings = decode_settings(raw).unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings[0].id, NotificationType::OrderUpdates);
        assert_eq!(settings[0].channel_id(), Some("C1"));
        assert_eq!(settings[0].message_prefix(), "New order!");
        // Empty channel value means disabled.
        assert!(!settings[1].is_enabled());
    }

    #[test]
    fn rejects_duplicate_setting_ids() {
        let raw = r#"[
            {"id": "orderUpdates", "channel": {"value": "C1", "label": "a"}},
            {"id": "orderUpdates", "channel": {"value": "C2", "label": "b"}}
        ]"#;
        assert!(matches!(
            decode_settings(raw),
            Err(Error::DuplicateSetting { .. })
        ));
    }

    #[test]
    fn rejects_unknown_setting_id() {
        let raw = r#"[{"id": "somethingElse"}]"#;
        assert!(decode_settings(raw).is_err());
    }

    #[test]
    fn missing_channel_means_disabled() {
        let raw = r#"[{"id": "lowStockAlerts"}]"#;
        let settings = decode_settings(raw).unwrap();
        assert!(!settings[0].is_enabled());
        assert_eq!(settings[0].channel_id(), None);
    }

    #[test]
    fn ledger_window_rolling() {
        let mut ledger = LowStockLedger::default();
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();

        assert!(ledger.should_notify("p1", "v1", d("2024-05-01")));
        ledger.record("p1", "v1", d("2024-05-03"));

        // Recorded inside the window: suppressed.
        assert!(!ledger.should_notify("p1", "v1", d("2024-05-01")));
        // Window start has rolled past the recorded date: notify again.
        assert!(ledger.should_notify("p1", "v1", d("2024-05-04")));
        // Other variants are unaffected.
        assert!(ledger.should_notify("p1", "v2", d("2024-05-01")));
    }

    #[test]
    fn ledger_survives_roundtrip() {
        let mut ledger = LowStockLedger::default();
        ledger.record("p1", "v1", NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());

        let raw = serde_json::to_string(&ledger).unwrap();
        assert!(raw.contains("\"2024-05-03\""));

        let restored: LowStockLedger = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            restored.last_notified("p1", "v1"),
            NaiveDate::from_ymd_opt(2024, 5, 3)
        );
    }

    #[test]
    fn unparseable_ledger_date_means_notify() {
        let ledger: LowStockLedger = serde_json::from_str(r#"{"p1": {"v1": "not-a-date"}}"#)
            .unwrap();
        assert!(ledger.should_notify("p1", "v1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    }

    #[test]
    fn connection_decodes_wire_shape() {
        let raw = r#"{"access_token": "xoxb-1", "team": {"name": "Acme"}}"#;
        let conn: ChatConnection = serde_json::from_str(raw).unwrap();
        assert_eq!(conn.access_token, "xoxb-1");
        assert_eq!(conn.team.name, "Acme");
    }

    #[test]
    fn connection_tolerates_missing_team() {
        let conn: ChatConnection = serde_json::from_str(r#"{"access_token": "t"}"#).unwrap();
        assert_eq!(conn.team.name, "");
    }
}
