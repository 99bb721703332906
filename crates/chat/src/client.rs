//! Slack Web API client: join, post, channel listing, token exchange.

use std::time::Duration;

use {
    reqwest::Client,
    serde::{Deserialize, Serialize},
    serde_json::json,
    tracing::{debug, info},
};

use crate::{Error, Result};

/// Production Web API root.
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Client for the chat workspace Web API.
///
/// One instance per process; every method takes the tenant's bearer token,
/// so a single client serves all tenants.
pub struct SlackClient {
    http: Client,
    base_url: String,
}

/// A joinable channel, as returned by `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Successful `oauth.v2.access` exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OauthAccess {
    pub access_token: String,
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
struct JoinResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct OauthResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    team: Option<OauthTeam>,
}

#[derive(Debug, Deserialize)]
struct OauthTeam {
    #[serde(default)]
    name: String,
}

impl SlackClient {
    /// Client against the production Web API.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an alternate API root. Tests point this at a local
    /// mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(Error::transport)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn receive<T: serde::de::DeserializeOwned>(
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let resp = request.send().await.map_err(Error::transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::rejected(method, format!("HTTP {status}: {body}")));
        }
        resp.json().await.map_err(Error::transport)
    }

    /// Join a channel so the bot may post into it. Idempotent: joining a
    /// channel the bot is already in succeeds.
    pub async fn join_channel(&self, token: &str, channel: &str) -> Result<()> {
        let method = "conversations.join";
        debug!(channel, "joining chat channel");

        let req = self
            .http
            .post(self.method_url(method))
            .bearer_auth(token)
            .json(&json!({ "channel": channel }));
        let resp: JoinResponse = Self::receive(method, req).await?;
        ensure_ok(method, resp.ok, resp.error)
    }

    /// Post `text` into `channel`, joining first. Returns the identifier of
    /// the posted message.
    ///
    /// No retry on failure; callers decide what a failed send means.
    pub async fn send_message(&self, token: &str, channel: &str, text: &str) -> Result<String> {
        self.join_channel(token, channel).await?;

        let method = "chat.postMessage";
        debug!(channel, chars = text.len(), "posting chat message");

        let req = self
            .http
            .post(self.method_url(method))
            .bearer_auth(token)
            .json(&json!({ "channel": channel, "text": text }));
        let resp: PostMessageResponse = Self::receive(method, req).await?;
        ensure_ok(method, resp.ok, resp.error)?;
        Ok(resp.ts.unwrap_or_default())
    }

    /// Public, unarchived channels visible to the token.
    pub async fn list_channels(&self, token: &str) -> Result<Vec<Channel>> {
        let method = "conversations.list";
        let req = self
            .http
            .get(self.method_url(method))
            .bearer_auth(token)
            .query(&[
                ("types", "public_channel"),
                ("exclude_archived", "true"),
                ("limit", "1000"),
            ]);
        let resp: ListResponse = Self::receive(method, req).await?;
        ensure_ok(method, resp.ok, resp.error)?;
        Ok(resp.channels)
    }

    /// Exchange an OAuth authorization code for a workspace token.
    ///
    /// The surrounding redirect flow lives outside this crate; this is the
    /// one token call the client owns.
    pub async fn oauth_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<OauthAccess> {
        let method = "oauth.v2.access";
        let mut form = vec![
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
        ];
        if let Some(uri) = redirect_uri {
            form.push(("redirect_uri", uri));
        }

        let req = self.http.post(self.method_url(method)).form(&form);
        let resp: OauthResponse = Self::receive(method, req).await?;
        ensure_ok(method, resp.ok, resp.error)?;

        let access = OauthAccess {
            access_token: resp.access_token.unwrap_or_default(),
            team_name: resp.team.map(|t| t.name).unwrap_or_default(),
        };
        info!(team = %access.team_name, "exchanged chat OAuth code");
        Ok(access)
    }
}

fn ensure_ok(method: &str, ok: bool, error: Option<String>) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::rejected(
            method,
            error.unwrap_or_else(|| "unknown error".into()),
        ))
    }
}
