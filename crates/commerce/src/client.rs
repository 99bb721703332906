//! GraphQL client for the commerce platform's per-shop Admin API.
//!
//! Every operation posts one GraphQL document to
//! `https://<shop-domain>/admin/api/<version>/graphql.json` with the
//! tenant's access token. Pagination is cursor-driven: callers feed the
//! returned cursor back into the next [`OrdersPageRequest`].

use std::time::Duration;

use {
    reqwest::Client,
    serde::{Deserialize, Serialize},
    serde_json::json,
    tracing::{debug, info},
};

use crate::{Error, Result, error::Context};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

const VARIANTS_QUERY: &str = "query($ids: [ID!]!) { nodes(ids: $ids) { \
     ... on ProductVariant { id title inventoryQuantity \
     product { id title hasOnlyDefaultVariant } } } }";

const SUBSCRIPTIONS_QUERY: &str =
    "query { webhookSubscriptions(first: 50) { edges { node { id topic } } } }";

const SUBSCRIPTION_DELETE: &str = "mutation($id: ID!) { \
     webhookSubscriptionDelete(id: $id) { \
     userErrors { field message } deletedWebhookSubscriptionId } }";

const SUBSCRIPTION_CREATE: &str = "mutation($topic: WebhookSubscriptionTopic!, \
     $webhookSubscription: WebhookSubscriptionInput!) { \
     webhookSubscriptionCreate(topic: $topic, webhookSubscription: $webhookSubscription) { \
     userErrors { field message } webhookSubscription { id } } }";

/// Client for the commerce platform's Admin GraphQL API.
///
/// One instance per process; every method takes the shop domain and access
/// token, so a single client serves all tenants.
pub struct CommerceClient {
    http: Client,
    api_version: String,
    base_override: Option<String>,
}

/// Shop fields the integration persists locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopMetadata {
    /// UTC offset string the platform reports, e.g. `"-0500"`.
    pub timezone_offset: String,
    /// Currency display template with `{{amount}}`-style tokens.
    pub money_format: String,
}

/// Parameters for one page of order history.
#[derive(Debug, Clone, Default)]
pub struct OrdersPageRequest {
    /// Search filter for the orders connection, e.g.
    /// `created_at:>=2024-01-01 created_at:<2024-01-08`.
    pub filter: String,
    pub page_size: u32,
    /// Cursor returned by the previous page; `None` fetches the first page.
    pub cursor: Option<String>,
    /// Also fetch per-order line items (product/variant gids + quantities).
    pub include_line_items: bool,
}

/// One fetched page of orders.
#[derive(Debug, Clone, Default)]
pub struct OrdersPage {
    pub orders: Vec<OrderNode>,
    /// Cursor of the last edge, to feed into the next request.
    pub cursor: Option<String>,
}

/// An order as the digest aggregators consume it.
#[derive(Debug, Clone, Default)]
pub struct OrderNode {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub fulfillment_status: String,
    pub financial_status: String,
    /// Decimal string, as the platform's Money scalar serializes.
    pub total_price: String,
    /// Empty unless the page was requested with line items.
    pub line_items: Vec<LineItem>,
}

/// One ordered product/variant pair. Ids are gids as returned by the
/// platform; [`crate::gid::numeric`] strips them down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: i64,
}

/// A variant plus enough product context to label and link it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub inventory_quantity: i64,
    #[serde(default)]
    pub product: ProductRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub has_only_default_variant: bool,
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default)]
    edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
    #[serde(default)]
    cursor: String,
}

#[derive(Debug, Default, Deserialize)]
struct OrdersData {
    #[serde(default)]
    orders: Connection<OrderWire>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderWire {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    display_fulfillment_status: String,
    #[serde(default)]
    display_financial_status: String,
    #[serde(default)]
    total_price: String,
    #[serde(default)]
    line_items: Connection<LineItemWire>,
}

#[derive(Debug, Default, Deserialize)]
struct LineItemWire {
    #[serde(default)]
    product: NodeRef,
    #[serde(default)]
    variant: NodeRef,
    #[serde(default)]
    quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
struct NodeRef {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionsData {
    #[serde(default)]
    webhook_subscriptions: Connection<SubscriptionWire>,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionWire {
    #[serde(default)]
    id: String,
    #[serde(default)]
    topic: String,
}

impl From<OrderWire> for OrderNode {
    fn from(wire: OrderWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            created_at: wire.created_at,
            fulfillment_status: wire.display_fulfillment_status,
            financial_status: wire.display_financial_status,
            total_price: wire.total_price,
            line_items: wire
                .line_items
                .edges
                .into_iter()
                .map(|edge| LineItem {
                    product_id: edge.node.product.id,
                    variant_id: edge.node.variant.id,
                    quantity: edge.node.quantity,
                })
                .collect(),
        }
    }
}

impl CommerceClient {
    /// Client against each shop's own Admin API domain.
    pub fn new(api_version: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(Error::transport)?;
        Ok(Self {
            http,
            api_version: api_version.into(),
            base_override: None,
        })
    }

    /// Client that sends every request to `base_url` instead of the shop's
    /// domain. Tests point this at a local mock server.
    pub fn with_base_url(
        api_version: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let mut client = Self::new(api_version)?;
        client.base_override = Some(base_url.into().trim_end_matches('/').to_string());
        Ok(client)
    }

    fn endpoint(&self, shop_domain: &str) -> String {
        let base = match &self.base_override {
            Some(base) => base.clone(),
            None => format!("https://{shop_domain}"),
        };
        format!("{base}/admin/api/{}/graphql.json", self.api_version)
    }

    /// Execute one document and return its `data` object.
    async fn graphql(
        &self,
        shop_domain: &str,
        access_token: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value> {
        debug!(shop = shop_domain, "posting commerce GraphQL document");
        let resp = self
            .http
            .post(self.endpoint(shop_domain))
            .header(ACCESS_TOKEN_HEADER, access_token)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(Error::transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::upstream(status.as_u16(), body));
        }

        let body: GraphqlResponse = resp.json().await.map_err(Error::transport)?;
        if !body.errors.is_empty() {
            return Err(Error::upstream(
                status.as_u16(),
                serde_json::Value::Array(body.errors).to_string(),
            ));
        }
        Ok(body.data)
    }

    /// Fetch the requested fields off the shop object. Nested fields pass
    /// through verbatim, e.g. `currencyFormats { moneyFormat }`.
    pub async fn shop_info(
        &self,
        shop_domain: &str,
        access_token: &str,
        fields: &[&str],
    ) -> Result<serde_json::Value> {
        let query = format!("query {{ shop {{ {} }} }}", fields.join(" "));
        let data = self
            .graphql(shop_domain, access_token, &query, serde_json::Value::Null)
            .await?;
        Ok(data.get("shop").cloned().unwrap_or_default())
    }

    /// The shop fields the scheduler and summary renderer read locally.
    pub async fn shop_metadata(
        &self,
        shop_domain: &str,
        access_token: &str,
    ) -> Result<ShopMetadata> {
        let shop = self
            .shop_info(
                shop_domain,
                access_token,
                &["timezoneOffset", "currencyFormats { moneyFormat }"],
            )
            .await?;
        let timezone_offset = shop
            .get("timezoneOffset")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let money_format = shop
            .pointer("/currencyFormats/moneyFormat")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(ShopMetadata {
            timezone_offset,
            money_format,
        })
    }

    /// Fetch one page of orders matching `request.filter`.
    pub async fn orders_page(
        &self,
        shop_domain: &str,
        access_token: &str,
        request: &OrdersPageRequest,
    ) -> Result<OrdersPage> {
        let query = orders_query(
            &request.filter,
            request.cursor.is_some(),
            request.include_line_items,
        );
        let mut variables = json!({ "pageSize": request.page_size });
        if let Some(cursor) = &request.cursor {
            variables["cursor"] = json!(cursor);
        }

        let data = self
            .graphql(shop_domain, access_token, &query, variables)
            .await?;
        let parsed: OrdersData = serde_json::from_value(data).context("malformed orders page")?;

        let mut page = OrdersPage::default();
        for Edge { node, cursor } in parsed.orders.edges {
            if !cursor.is_empty() {
                page.cursor = Some(cursor);
            }
            page.orders.push(OrderNode::from(node));
        }
        Ok(page)
    }

    /// Current inventory and display titles for a batch of variant gids.
    ///
    /// Unknown ids come back as nulls from the platform and are dropped.
    pub async fn variants_by_ids(
        &self,
        shop_domain: &str,
        access_token: &str,
        ids: &[String],
    ) -> Result<Vec<VariantDetail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .graphql(
                shop_domain,
                access_token,
                VARIANTS_QUERY,
                json!({ "ids": ids }),
            )
            .await?;
        let nodes: Vec<Option<VariantDetail>> =
            serde_json::from_value(data.get("nodes").cloned().unwrap_or_default())
                .context("malformed variant batch")?;
        Ok(nodes
            .into_iter()
            .flatten()
            .filter(|node| !node.id.is_empty())
            .collect())
    }

    /// Replace the shop's webhook subscriptions with `topics`, all pointed
    /// at `endpoint`. Existing subscriptions are deleted first, so repeated
    /// calls converge on exactly the requested set. Returns the number of
    /// subscriptions created.
    pub async fn register_webhooks(
        &self,
        shop_domain: &str,
        access_token: &str,
        topics: &[String],
        endpoint: &str,
    ) -> Result<usize> {
        let data = self
            .graphql(
                shop_domain,
                access_token,
                SUBSCRIPTIONS_QUERY,
                serde_json::Value::Null,
            )
            .await?;
        let existing: SubscriptionsData =
            serde_json::from_value(data).context("malformed subscription list")?;

        let replaced = existing.webhook_subscriptions.edges.len();
        for edge in existing.webhook_subscriptions.edges {
            debug!(
                id = %edge.node.id,
                topic = %edge.node.topic,
                "deleting webhook subscription"
            );
            let data = self
                .graphql(
                    shop_domain,
                    access_token,
                    SUBSCRIPTION_DELETE,
                    json!({ "id": edge.node.id }),
                )
                .await?;
            check_user_errors("webhookSubscriptionDelete", &data)?;
        }

        for topic in topics {
            let variables = json!({
                "topic": subscription_topic(topic),
                "webhookSubscription": { "callbackUrl": endpoint, "format": "JSON" },
            });
            let data = self
                .graphql(shop_domain, access_token, SUBSCRIPTION_CREATE, variables)
                .await?;
            check_user_errors("webhookSubscriptionCreate", &data)?;
        }

        info!(
            shop = shop_domain,
            replaced,
            created = topics.len(),
            "webhook subscriptions registered"
        );
        Ok(topics.len())
    }
}

fn orders_query(filter: &str, with_cursor: bool, include_line_items: bool) -> String {
    let cursor_var = if with_cursor { ", $cursor: String" } else { "" };
    let cursor_arg = if with_cursor { "after: $cursor, " } else { "" };
    let line_items = if include_line_items {
        " lineItems(first: 250) { edges { node { product { id } variant { id } quantity } } }"
    } else {
        ""
    };
    format!(
        "query($pageSize: Int!{cursor_var}) {{ \
         orders(first: $pageSize, {cursor_arg}query: \"{filter}\", reverse: false) {{ \
         edges {{ node {{ id name createdAt displayFulfillmentStatus \
         displayFinancialStatus totalPrice{line_items} }} cursor }} }} }}"
    )
}

/// `orders/create` → `ORDERS_CREATE`, the subscription-topic enum spelling.
fn subscription_topic(topic: &str) -> String {
    topic.to_ascii_uppercase().replace('/', "_")
}

fn check_user_errors(mutation: &str, data: &serde_json::Value) -> Result<()> {
    let errors = data
        .pointer(&format!("/{mutation}/userErrors"))
        .and_then(serde_json::Value::as_array);
    match errors {
        Some(list) if !list.is_empty() => Err(Error::upstream(
            200,
            format!("{mutation}: {}", serde_json::Value::Array(list.clone())),
        )),
        _ => Ok(()),
    }
}
