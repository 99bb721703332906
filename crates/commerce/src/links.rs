//! Admin deep links embedded in outbound notifications.

/// `acme.myshopify.com` → `acme`, the store handle admin URLs use.
#[must_use]
pub fn store_handle(shop_domain: &str) -> &str {
    shop_domain
        .strip_suffix(".myshopify.com")
        .unwrap_or(shop_domain)
}

/// Deep link to an order in the admin UI.
#[must_use]
pub fn order_link(shop_domain: &str, order_id: i64) -> String {
    format!(
        "https://admin.shopify.com/store/{}/orders/{order_id}",
        store_handle(shop_domain)
    )
}

/// Deep link to a product variant in the admin UI. Ids are numeric.
#[must_use]
pub fn variant_link(shop_domain: &str, product_id: &str, variant_id: &str) -> String {
    format!(
        "https://admin.shopify.com/store/{}/products/{product_id}/variants/{variant_id}",
        store_handle(shop_domain)
    )
}
