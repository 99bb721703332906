//! Deterministic message formatting for outbound notifications.

use crate::payload::{OrderLineItem, ShippingAddress};

/// Comma-join the non-empty address parts: street, unit, `zip city`,
/// province, country. Empty parts drop out without leaving double
/// separators.
#[must_use]
pub fn compose_address(address: &ShippingAddress) -> String {
    let zip_city = [address.zip.as_str(), address.city.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    [
        address.address1.as_str(),
        address.address2.as_str(),
        zip_city.as_str(),
        address.province.as_str(),
        address.country.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(", ")
}

/// Pipe-delimited product names, variant titles in parentheses.
#[must_use]
pub fn product_list(items: &[OrderLineItem]) -> String {
    items
        .iter()
        .map(|item| match item.variant_title.as_deref() {
            Some(variant) if !variant.is_empty() => format!("{} ({variant})", item.name),
            _ => item.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Prepend the tenant's custom prefix line when one is configured.
#[must_use]
pub fn with_prefix(prefix: &str, body: &str) -> String {
    if prefix.trim().is_empty() {
        body.to_string()
    } else {
        format!("{prefix}\n{body}")
    }
}
