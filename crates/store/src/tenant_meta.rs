//! Typed access to one tenant's meta entries.

use {
    chrono::NaiveDateTime,
    tracing::warn,
};

use crate::{
    Result, keys,
    store::MetaStore,
    types::{ChatConnection, LowStockLedger, NotificationSetting, NotificationType},
};

/// Timestamp format used by dedup stamps.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Typed view over one tenant's meta entries.
///
/// Thin and borrow-based so callers construct it per operation from an
/// injected [`MetaStore`] and a tenant id.
pub struct TenantMeta<'a> {
    store: &'a dyn MetaStore,
    tenant_id: &'a str,
}

impl<'a> TenantMeta<'a> {
    #[must_use]
    pub fn new(store: &'a dyn MetaStore, tenant_id: &'a str) -> Self {
        Self { store, tenant_id }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(keys::KIND_SHOP, self.tenant_id, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store
            .set(keys::KIND_SHOP, self.tenant_id, key, value)
            .await
    }

    /// The stored chat authorization, `None` when the workspace was never
    /// connected.
    pub async fn chat_connection(&self) -> Result<Option<ChatConnection>> {
        match self.get(keys::CHAT_CONNECTION).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_chat_connection(&self, connection: &ChatConnection) -> Result<()> {
        self.set(keys::CHAT_CONNECTION, &serde_json::to_string(connection)?)
            .await
    }

    /// All notification settings; empty when the tenant never saved any.
    pub async fn notification_settings(&self) -> Result<Vec<NotificationSetting>> {
        match self.get(keys::NOTIFICATION_SETTINGS).await? {
            Some(raw) => crate::types::decode_settings(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// The setting for one notification type, if present.
    pub async fn setting(&self, ty: NotificationType) -> Result<Option<NotificationSetting>> {
        Ok(self
            .notification_settings()
            .await?
            .into_iter()
            .find(|s| s.id == ty))
    }

    pub async fn set_notification_settings(
        &self,
        settings: &[NotificationSetting],
    ) -> Result<()> {
        self.set(
            keys::NOTIFICATION_SETTINGS,
            &serde_json::to_string(settings)?,
        )
        .await
    }

    /// Raw dedup stamp as stored, for compare-and-set hand-back.
    pub async fn notified_stamp_raw(&self, ty: NotificationType) -> Result<Option<String>> {
        self.get(&keys::notified(ty)).await
    }

    /// Parsed dedup stamp; unparseable values are treated as absent.
    pub async fn notified_stamp(&self, ty: NotificationType) -> Result<Option<NaiveDateTime>> {
        Ok(self
            .notified_stamp_raw(ty)
            .await?
            .and_then(|raw| parse_stamp(&raw)))
    }

    pub async fn set_notified_stamp(&self, ty: NotificationType, at: NaiveDateTime) -> Result<()> {
        self.set(&keys::notified(ty), &format_stamp(at)).await
    }

    /// Claim the dedup stamp: succeeds only when the stored value still equals
    /// `expected`. A `false` return means another run claimed this tenant.
    pub async fn claim_notified_stamp(
        &self,
        ty: NotificationType,
        expected: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<bool> {
        self.store
            .compare_and_set(
                keys::KIND_SHOP,
                self.tenant_id,
                &keys::notified(ty),
                expected,
                &format_stamp(at),
            )
            .await
    }

    /// The low-stock ledger; a corrupt blob is replaced with an empty one
    /// rather than failing the run.
    pub async fn low_stock_ledger(&self) -> Result<LowStockLedger> {
        match self.get(keys::LOW_STOCK_LEDGER).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(ledger) => Ok(ledger),
                Err(e) => {
                    warn!(tenant = self.tenant_id, error = %e, "corrupt low-stock ledger, starting fresh");
                    Ok(LowStockLedger::default())
                },
            },
            None => Ok(LowStockLedger::default()),
        }
    }

    pub async fn save_low_stock_ledger(&self, ledger: &LowStockLedger) -> Result<()> {
        self.set(keys::LOW_STOCK_LEDGER, &serde_json::to_string(ledger)?)
            .await
    }

    pub async fn timezone_offset(&self) -> Result<Option<String>> {
        self.get(keys::TIMEZONE_OFFSET).await
    }

    pub async fn set_timezone_offset(&self, offset: &str) -> Result<()> {
        self.set(keys::TIMEZONE_OFFSET, offset).await
    }

    pub async fn money_format(&self) -> Result<Option<String>> {
        self.get(keys::MONEY_FORMAT).await
    }

    pub async fn set_money_format(&self, template: &str) -> Result<()> {
        self.set(keys::MONEY_FORMAT, template).await
    }
}

/// Parse a stored dedup stamp, `None` on garbage.
#[must_use]
pub fn parse_stamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, STAMP_FORMAT).ok()
}

#[must_use]
pub fn format_stamp(at: NaiveDateTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{store_memory::MemoryMetaStore, types::Team},
    };

    fn stamp(s: &str) -> NaiveDateTime {
        parse_stamp(s).unwrap()
    }

    #[tokio::test]
    async fn test_connection_roundtrip() {
        let store = MemoryMetaStore::new();
        let meta = TenantMeta::new(&store, "1");
        assert!(meta.chat_connection().await.unwrap().is_none());

        let conn = ChatConnection {
            access_token: "xoxb-1".into(),
            team: Team {
                name: "Acme".into(),
            },
        };
        meta.set_chat_connection(&conn).await.unwrap();
        assert_eq!(meta.chat_connection().await.unwrap(), Some(conn));
    }

    #[tokio::test]
    async fn test_settings_lookup() {
        let store = MemoryMetaStore::new();
        store
            .set(
                keys::KIND_SHOP,
                "1",
                keys::NOTIFICATION_SETTINGS,
                r##"[{"id": "orderUpdates", "channel": {"value": "C1", "label": "#o"}}]"##,
            )
            .await
            .unwrap();

        let meta = TenantMeta::new(&store, "1");
        let setting = meta.setting(NotificationType::OrderUpdates).await.unwrap();
        assert_eq!(setting.unwrap().channel_id(), Some("C1"));
        assert!(meta
            .setting(NotificationType::DailySummary)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stamp_roundtrip_and_garbage() {
        let store = MemoryMetaStore::new();
        let meta = TenantMeta::new(&store, "1");
        let ty = NotificationType::DailySummary;

        assert!(meta.notified_stamp(ty).await.unwrap().is_none());

        meta.set_notified_stamp(ty, stamp("2024-05-03 10:00:00"))
            .await
            .unwrap();
        assert_eq!(
            meta.notified_stamp(ty).await.unwrap(),
            Some(stamp("2024-05-03 10:00:00"))
        );
        assert_eq!(
            meta.notified_stamp_raw(ty).await.unwrap().as_deref(),
            Some("2024-05-03 10:00:00")
        );

        // Garbage parses as absent, not as an error.
        store
            .set(keys::KIND_SHOP, "1", &keys::notified(ty), "garbage")
            .await
            .unwrap();
        assert!(meta.notified_stamp(ty).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_stamp_cas() {
        let store = MemoryMetaStore::new();
        let meta = TenantMeta::new(&store, "1");
        let ty = NotificationType::LowStockAlerts;

        // First claim on an absent stamp.
        assert!(meta
            .claim_notified_stamp(ty, None, stamp("2024-05-03 10:00:00"))
            .await
            .unwrap());
        // A second run that also read "absent" loses the race.
        assert!(!meta
            .claim_notified_stamp(ty, None, stamp("2024-05-03 10:00:01"))
            .await
            .unwrap());
        // A run that read the current value wins.
        assert!(meta
            .claim_notified_stamp(
                ty,
                Some("2024-05-03 10:00:00"),
                stamp("2024-05-04 10:00:00")
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_ledger_starts_fresh() {
        let store = MemoryMetaStore::new();
        store
            .set(keys::KIND_SHOP, "1", keys::LOW_STOCK_LEDGER, "not json")
            .await
            .unwrap();
        let meta = TenantMeta::new(&store, "1");
        assert!(meta.low_stock_ledger().await.unwrap().is_empty());
    }
}
