//! Low-stock detection over the recent order history.
//!
//! Walks every order in the lookback window, totals the quantity sold per
//! variant, and flags variants whose current inventory is below that total.
//! A per-tenant ledger suppresses repeats until the window rolls past the
//! last report.

use std::{collections::BTreeMap, sync::Arc};

use {
    chrono::{DateTime, Duration, SecondsFormat, Utc},
    tracing::debug,
};

use {
    merchbell_commerce::{CommerceClient, OrdersPageRequest, gid, links::variant_link},
    merchbell_store::{MetaStore, Tenant, TenantMeta},
};

use crate::Result;

pub struct LowStockDetector {
    commerce: Arc<CommerceClient>,
    page_size: u32,
    lookback_days: i64,
}

impl LowStockDetector {
    #[must_use]
    pub fn new(commerce: Arc<CommerceClient>, page_size: u32, lookback_days: i64) -> Self {
        Self {
            commerce,
            page_size,
            lookback_days,
        }
    }

    /// One report line per newly low variant, admin link included. Variants
    /// already reported inside the window are suppressed through the
    /// tenant's ledger; the ledger is saved back when anything was flagged.
    pub async fn detect(
        &self,
        store: &dyn MetaStore,
        tenant: &Tenant,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let window_start = now - Duration::days(self.lookback_days);
        let ordered = self.ordered_quantities(tenant, window_start).await?;

        let ids: Vec<String> = ordered.keys().map(|(_, v)| gid::variant(v)).collect();
        let variants = self
            .commerce
            .variants_by_ids(&tenant.shop_domain, &tenant.access_token, &ids)
            .await?;

        let meta = TenantMeta::new(store, &tenant.id);
        let mut ledger = meta.low_stock_ledger().await?;
        let window_date = window_start.date_naive();
        let today = now.date_naive();

        let mut lines = Vec::new();
        for variant in &variants {
            let variant_id = gid::numeric(&variant.id).to_string();
            let product_id = gid::numeric(&variant.product.id).to_string();
            let Some(&sold) = ordered.get(&(product_id.clone(), variant_id.clone())) else {
                continue;
            };
            if variant.inventory_quantity >= sold {
                continue;
            }
            if !ledger.should_notify(&product_id, &variant_id, window_date) {
                debug!(
                    tenant = tenant.id,
                    product = product_id,
                    variant = variant_id,
                    "low stock already reported inside the window"
                );
                continue;
            }

            let label = if variant.product.has_only_default_variant {
                variant.product.title.clone()
            } else {
                format!("{} - {}", variant.product.title, variant.title)
            };
            let link = variant_link(&tenant.shop_domain, &product_id, &variant_id);
            lines.push(format!("{label} ({link})"));
            ledger.record(&product_id, &variant_id, today);
        }

        if !lines.is_empty() {
            meta.save_low_stock_ledger(&ledger).await?;
        }
        Ok(lines)
    }

    /// Total quantity sold per `(product, variant)` pair since `window_start`.
    async fn ordered_quantities(
        &self,
        tenant: &Tenant,
        window_start: DateTime<Utc>,
    ) -> Result<BTreeMap<(String, String), i64>> {
        let filter = format!(
            "created_at:>={}",
            window_start.to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        let mut ordered = BTreeMap::new();
        let mut cursor = None;
        loop {
            let page = self
                .commerce
                .orders_page(
                    &tenant.shop_domain,
                    &tenant.access_token,
                    &OrdersPageRequest {
                        filter: filter.clone(),
                        page_size: self.page_size,
                        cursor,
                        include_line_items: true,
                    },
                )
                .await?;

            for order in &page.orders {
                for item in &order.line_items {
                    // Custom line items carry no product or variant.
                    if item.product_id.is_empty() || item.variant_id.is_empty() {
                        continue;
                    }
                    let key = (
                        gid::numeric(&item.product_id).to_string(),
                        gid::numeric(&item.variant_id).to_string(),
                    );
                    *ordered.entry(key).or_default() += item.quantity;
                }
            }

            if page.orders.len() < self.page_size as usize || page.cursor.is_none() {
                break;
            }
            cursor = page.cursor;
        }
        Ok(ordered)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        merchbell_store::MemoryMetaStore,
        mockito::{Matcher, Server},
        serde_json::json,
    };

    use super::*;

    fn tenant() -> Tenant {
        Tenant {
            id: "1".into(),
            shop_domain: "acme.myshopify.com".into(),
            access_token: "shptoken".into(),
        }
    }

    fn order(id: &str, items: serde_json::Value) -> serde_json::Value {
        json!({
            "node": {
                "id": format!("gid://shopify/Order/{id}"),
                "name": format!("#{id}"),
                "createdAt": "2024-05-02T09:00:00Z",
                "displayFulfillmentStatus": "UNFULFILLED",
                "displayFinancialStatus": "PAID",
                "totalPrice": "10.00",
                "lineItems": { "edges": items }
            },
            "cursor": format!("cur-{id}")
        })
    }

    fn item(product: &str, variant: &str, quantity: i64) -> serde_json::Value {
        json!({
            "node": {
                "product": { "id": format!("gid://shopify/Product/{product}") },
                "variant": { "id": format!("gid://shopify/ProductVariant/{variant}") },
                "quantity": quantity
            }
        })
    }

    fn variant_node(
        product: &str,
        variant: &str,
        product_title: &str,
        variant_title: &str,
        only_default: bool,
        stock: i64,
    ) -> serde_json::Value {
        json!({
            "id": format!("gid://shopify/ProductVariant/{variant}"),
            "title": variant_title,
            "inventoryQuantity": stock,
            "product": {
                "id": format!("gid://shopify/Product/{product}"),
                "title": product_title,
                "hasOnlyDefaultVariant": only_default
            }
        })
    }

    fn now() -> DateTime<Utc> {
        "2024-05-03T12:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn flags_variants_sold_past_their_stock() {
        let mut server = Server::new_async().await;
        let orders = server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("lineItems".into()))
            .with_body(
                json!({
                    "data": { "orders": { "edges": [
                        order("1", json!([item("9", "91", 3), item("7", "71", 1)])),
                        order("2", json!([item("9", "91", 2)])),
                    ]}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let variants = server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("nodes\\(ids".into()))
            .with_body(
                json!({
                    "data": { "nodes": [
                        // Five sold, two left: low.
                        variant_node("9", "91", "Mug", "Large", false, 2),
                        // One sold, plenty left.
                        variant_node("7", "71", "Sticker", "Default Title", true, 40),
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let detector = LowStockDetector::new(commerce(&server), 250, 7);
        let store = MemoryMetaStore::new();
        let lines = detector.detect(&store, &tenant(), now()).await.unwrap();

        assert_eq!(
            lines,
            vec![
                "Mug - Large (https://admin.shopify.com/store/acme/products/9/variants/91)"
                    .to_string()
            ]
        );
        orders.assert_async().await;
        variants.assert_async().await;

        // The flagged pair lands in the ledger under today's date.
        let meta = TenantMeta::new(&store, "1");
        let ledger = meta.low_stock_ledger().await.unwrap();
        assert_eq!(ledger.last_notified("9", "91"), Some(now().date_naive()));
        assert_eq!(ledger.last_notified("7", "71"), None);
    }

    #[tokio::test]
    async fn follows_the_cursor_until_a_short_page() {
        let mut server = Server::new_async().await;
        // Page size 2: the first page is full, the second is short. The
        // first request carries no cursor variable, which keeps the two
        // body matchers disjoint.
        let first = server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("\"variables\":\\{\"pageSize\":2\\}".into()))
            .with_body(
                json!({
                    "data": { "orders": { "edges": [
                        order("1", json!([item("9", "91", 1)])),
                        order("2", json!([item("9", "91", 1)])),
                    ]}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("lineItems".into()),
                Matcher::Regex("\"cursor\":\"cur-2\"".into()),
            ]))
            .with_body(
                json!({
                    "data": { "orders": { "edges": [
                        order("3", json!([item("9", "91", 1)])),
                    ]}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let variants = server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("nodes\\(ids".into()))
            .with_body(
                json!({
                    "data": { "nodes": [
                        variant_node("9", "91", "Mug", "Default Title", true, 1),
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let detector = LowStockDetector::new(commerce(&server), 2, 7);
        let store = MemoryMetaStore::new();
        let lines = detector.detect(&store, &tenant(), now()).await.unwrap();

        // Three sold across both pages against one in stock.
        assert_eq!(
            lines,
            vec!["Mug (https://admin.shopify.com/store/acme/products/9/variants/91)".to_string()]
        );
        first.assert_async().await;
        second.assert_async().await;
        variants.assert_async().await;
    }

    #[tokio::test]
    async fn suppresses_variants_reported_inside_the_window() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("lineItems".into()))
            .with_body(
                json!({
                    "data": { "orders": { "edges": [
                        order("1", json!([item("9", "91", 5)])),
                    ]}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("nodes\\(ids".into()))
            .with_body(
                json!({
                    "data": { "nodes": [
                        variant_node("9", "91", "Mug", "Default Title", true, 0),
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = MemoryMetaStore::new();
        {
            let meta = TenantMeta::new(&store, "1");
            let mut ledger = meta.low_stock_ledger().await.unwrap();
            // Reported yesterday, well inside the seven-day window.
            ledger.record("9", "91", "2024-05-02".parse().unwrap());
            meta.save_low_stock_ledger(&ledger).await.unwrap();
        }

        let detector = LowStockDetector::new(commerce(&server), 250, 7);
        let lines = detector.detect(&store, &tenant(), now()).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn reports_again_once_the_window_rolls_past() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("lineItems".into()))
            .with_body(
                json!({
                    "data": { "orders": { "edges": [
                        order("1", json!([item("9", "91", 5)])),
                    ]}}
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .match_body(Matcher::Regex("nodes\\(ids".into()))
            .with_body(
                json!({
                    "data": { "nodes": [
                        variant_node("9", "91", "Mug", "Default Title", true, 0),
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let store = MemoryMetaStore::new();
        {
            let meta = TenantMeta::new(&store, "1");
            let mut ledger = meta.low_stock_ledger().await.unwrap();
            // Reported ten days ago, before the window start.
            ledger.record("9", "91", "2024-04-23".parse().unwrap());
            meta.save_low_stock_ledger(&ledger).await.unwrap();
        }

        let detector = LowStockDetector::new(commerce(&server), 250, 7);
        let lines = detector.detect(&store, &tenant(), now()).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn quiet_window_skips_the_variant_lookup() {
        let mut server = Server::new_async().await;
        let orders = server
            .mock("POST", "/admin/api/2024-10/graphql.json")
            .with_body(json!({ "data": { "orders": { "edges": [] } } }).to_string())
            .expect(1)
            .create_async()
            .await;

        let detector = LowStockDetector::new(commerce(&server), 250, 7);
        let store = MemoryMetaStore::new();
        let lines = detector.detect(&store, &tenant(), now()).await.unwrap();

        assert!(lines.is_empty());
        orders.assert_async().await;
    }

    fn commerce(server: &Server) -> Arc<CommerceClient> {
        Arc::new(CommerceClient::with_base_url("2024-10", server.url()).unwrap())
    }
}
