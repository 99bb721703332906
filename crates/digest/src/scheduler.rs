//! Scheduled digest fan-out.
//!
//! Each cron tick picks the first tenant due for a notification type,
//! claims its dedup stamp, gathers the report, and posts it. At most one
//! tenant is consumed per tick; the caller invokes the tick repeatedly.

use std::sync::Arc;

use {
    chrono::{DateTime, Duration, NaiveDateTime, Utc},
    tracing::{debug, info, warn},
};

use {
    merchbell_chat::SlackClient,
    merchbell_commerce::CommerceClient,
    merchbell_config::{DigestConfig, SendWindow},
    merchbell_store::{
        MetaStore, NotificationSetting, NotificationType, Tenant, TenantDirectory, TenantMeta,
        tenant_meta::parse_stamp,
    },
};

use crate::{
    Result,
    low_stock::LowStockDetector,
    summary::SummaryAggregator,
    time::{local_hour, parse_utc_offset},
};

/// The two cron-driven digest families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    LowStock,
    DailySummary,
}

impl DigestKind {
    /// The notification setting and dedup stamp this digest runs under.
    #[must_use]
    pub fn notification_type(self) -> NotificationType {
        match self {
            Self::LowStock => NotificationType::LowStockAlerts,
            Self::DailySummary => NotificationType::DailySummary,
        }
    }
}

/// Time of day written into dedup stamps.
const STAMP_HOUR: u32 = 10;

/// How long a stamp holds a tenant out of the eligible set.
const DEDUP_HOURS: i64 = 24;

pub struct NotificationScheduler {
    store: Arc<dyn MetaStore>,
    tenants: Arc<dyn TenantDirectory>,
    chat: Arc<SlackClient>,
    window: SendWindow,
    low_stock: LowStockDetector,
    summary: SummaryAggregator,
}

impl NotificationScheduler {
    #[must_use]
    pub fn new(
        store: Arc<dyn MetaStore>,
        tenants: Arc<dyn TenantDirectory>,
        chat: Arc<SlackClient>,
        commerce: Arc<CommerceClient>,
        config: &DigestConfig,
    ) -> Self {
        Self {
            store,
            tenants,
            chat,
            window: config.send_window,
            low_stock: LowStockDetector::new(
                Arc::clone(&commerce),
                config.page_size,
                config.low_stock_lookback_days,
            ),
            summary: SummaryAggregator::new(
                commerce,
                config.page_size,
                config.summary_lookback_days,
            ),
        }
    }

    /// One cron tick: of all tenants due for `kind`, process the first.
    /// Returns the ids of the tenants consumed.
    pub async fn run(&self, kind: DigestKind) -> Result<Vec<String>> {
        self.run_at(kind, Utc::now()).await
    }

    /// [`Self::run`] against an explicit clock.
    ///
    /// A tenant whose setting is disabled is stamped and skipped without
    /// any upstream call. An enabled tenant is stamped first, by
    /// compare-and-set against the value read during selection, and only
    /// then fetched and posted. A failed send therefore still counts as
    /// the day's attempt; a lost claim means a concurrent run owns the
    /// tenant and this tick backs off.
    pub async fn run_at(&self, kind: DigestKind, now: DateTime<Utc>) -> Result<Vec<String>> {
        let ty = kind.notification_type();
        let Some((tenant, expected_stamp)) = self.next_due(ty, now).await? else {
            return Ok(Vec::new());
        };

        let meta = TenantMeta::new(self.store.as_ref(), &tenant.id);
        let stamp_at = stamp_value(now);

        let setting = meta.setting(ty).await?;
        let Some(setting) = setting.filter(NotificationSetting::is_enabled) else {
            meta.set_notified_stamp(ty, stamp_at).await?;
            debug!(tenant = tenant.id, kind = ?kind, "digest disabled, stamped and skipped");
            return Ok(vec![tenant.id]);
        };

        if !meta
            .claim_notified_stamp(ty, expected_stamp.as_deref(), stamp_at)
            .await?
        {
            info!(tenant = tenant.id, kind = ?kind, "lost the stamp claim, backing off");
            return Ok(Vec::new());
        }

        let lines = match kind {
            DigestKind::LowStock => {
                self.low_stock
                    .detect(self.store.as_ref(), &tenant, now)
                    .await?
            },
            DigestKind::DailySummary => {
                self.summary
                    .summarize(self.store.as_ref(), &tenant, now)
                    .await?
            },
        };
        if lines.is_empty() {
            info!(tenant = tenant.id, kind = ?kind, "nothing to report");
            return Ok(vec![tenant.id]);
        }

        let Some(connection) = meta.chat_connection().await? else {
            warn!(tenant = tenant.id, "no chat connection, digest dropped");
            return Ok(vec![tenant.id]);
        };
        let Some(channel) = setting.channel_id() else {
            return Ok(vec![tenant.id]);
        };

        let body = lines.join("\n");
        let prefix = setting.message_prefix();
        let message = if prefix.trim().is_empty() {
            body
        } else {
            format!("{prefix}\n{body}")
        };

        match self
            .chat
            .send_message(&connection.access_token, channel, &message)
            .await
        {
            Ok(_) => info!(tenant = tenant.id, channel, kind = ?kind, "digest sent"),
            Err(e) => warn!(tenant = tenant.id, error = %e, "digest send failed"),
        }
        Ok(vec![tenant.id])
    }

    /// The first tenant due for `ty`: dedup stamp absent or older than the
    /// horizon, and local hour inside the send window. Returns the raw
    /// stamp alongside for the later compare-and-set.
    async fn next_due(
        &self,
        ty: NotificationType,
        now: DateTime<Utc>,
    ) -> Result<Option<(Tenant, Option<String>)>> {
        let horizon = (now - Duration::hours(DEDUP_HOURS)).naive_utc();
        for tenant in self.tenants.list().await? {
            let meta = TenantMeta::new(self.store.as_ref(), &tenant.id);
            let raw = meta.notified_stamp_raw(ty).await?;
            if let Some(stamp) = raw.as_deref().and_then(parse_stamp) {
                if stamp > horizon {
                    continue;
                }
            }

            let offset = meta.timezone_offset().await?.unwrap_or_default();
            let hour = local_hour(now, parse_utc_offset(&offset));
            if !self.window.contains(hour) {
                debug!(tenant = tenant.id, hour, "outside the send window");
                continue;
            }
            return Ok(Some((tenant, raw)));
        }
        Ok(None)
    }
}

/// Stamp for `now`: today's date at the fixed stamp hour.
fn stamp_value(now: DateTime<Utc>) -> NaiveDateTime {
    now.date_naive()
        .and_hms_opt(STAMP_HOUR, 0, 0)
        .unwrap_or_else(|| now.naive_utc())
}
