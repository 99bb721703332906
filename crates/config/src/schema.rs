//! Config schema types (server, store, commerce, chat, digest).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchbellConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub commerce: CommerceConfig,
    pub chat: ChatConfig,
    pub digest: DigestConfig,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Externally reachable base URL, used when registering webhook
    /// subscriptions (e.g. `https://merchbell.example.com`).
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8787,
            public_url: None,
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "merchbell.db".into(),
        }
    }
}

/// Commerce platform (Shopify Admin API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommerceConfig {
    /// Admin API version segment in the GraphQL endpoint path.
    pub api_version: String,
    /// App shared secret used to verify webhook HMAC signatures.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub shared_secret: Option<Secret<String>>,
    /// Webhook topics to register for each connected shop.
    pub webhook_topics: Vec<String>,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            api_version: "2024-10".into(),
            shared_secret: None,
            webhook_topics: vec!["orders/create".into(), "variants/out_of_stock".into()],
        }
    }
}

impl CommerceConfig {
    /// The webhook shared secret as a plain string, empty when unset.
    pub fn shared_secret_value(&self) -> String {
        self.shared_secret
            .as_ref()
            .map(|s| s.expose_secret().clone())
            .unwrap_or_default()
    }
}

/// Chat workspace (Slack Web API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Web API base URL. Overridable for tests.
    pub base_url: String,
    /// OAuth client id for `oauth.v2.access` token exchange.
    pub client_id: Option<String>,
    /// OAuth client secret for `oauth.v2.access` token exchange.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<Secret<String>>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slack.com/api".into(),
            client_id: None,
            client_secret: None,
        }
    }
}

/// Scheduled digest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Order-history window for the low-stock check, in days.
    pub low_stock_lookback_days: i64,
    /// Order-history window for the daily summary, in days.
    pub summary_lookback_days: i64,
    /// Orders fetched per GraphQL page.
    pub page_size: u32,
    /// Tenant-local hour window in which digests may be sent.
    pub send_window: SendWindow,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            low_stock_lookback_days: 7,
            summary_lookback_days: 1,
            page_size: 250,
            send_window: SendWindow::default(),
        }
    }
}

/// Inclusive local-hour range gating scheduled sends.
///
/// The default admits every hour; deployments that only want mid-morning
/// digests can narrow it (e.g. `start_hour = 10`, `end_hour = 12`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SendWindow {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl Default for SendWindow {
    fn default() -> Self {
        Self {
            start_hour: 0,
            end_hour: 23,
        }
    }
}

impl SendWindow {
    /// Whether `hour` (0-23) falls inside the window.
    #[must_use]
    pub fn contains(&self, hour: u8) -> bool {
        hour >= self.start_hour && hour <= self.end_hour
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
