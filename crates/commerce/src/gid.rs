//! Global-id helpers.
//!
//! The platform identifies objects with URI-style gids
//! (`gid://shopify/ProductVariant/123`); webhook payloads, ledger keys, and
//! admin deep links all use the trailing numeric id.

/// Build a variant gid from its numeric id.
#[must_use]
pub fn variant(id: &str) -> String {
    format!("gid://shopify/ProductVariant/{id}")
}

/// Trailing numeric id of a gid. Strings without a `/` come back unchanged.
#[must_use]
pub fn numeric(gid: &str) -> &str {
    gid.rsplit('/').next().unwrap_or(gid)
}
