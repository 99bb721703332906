//! Webhook event bodies, tolerant of missing fields.
//!
//! The platform's payloads carry far more than the handlers read; these
//! structs keep only the consumed fields and default everything, so a
//! sparse payload formats to a sparse message instead of failing.

use serde::Deserialize;

/// `orders/create` event body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderCreatedPayload {
    #[serde(default)]
    pub id: i64,
    /// Decimal string, e.g. `"100.00"`.
    #[serde(default)]
    pub current_total_price: String,
    /// ISO 4217 code, e.g. `"USD"`.
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderLineItem {
    #[serde(default)]
    pub name: String,
    /// `None` or empty for products with only the default variant.
    #[serde(default)]
    pub variant_title: Option<String>,
}

/// `variants/out_of_stock` event body. Only the numeric variant id is used;
/// titles come from a follow-up commerce lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantOutOfStockPayload {
    #[serde(default)]
    pub id: i64,
}
