//! Cursor-paginated GraphQL client for the commerce platform's Admin API.
//!
//! Covers the four operations the integration needs: shop metadata, order
//! pagination, variant batch lookup, and webhook-subscription replacement.
//! Everything speaks per-shop endpoints; the caller supplies the shop
//! domain and access token on each call.

pub mod client;
pub mod error;
pub mod gid;
pub mod links;

pub use {
    client::{
        CommerceClient, LineItem, OrderNode, OrdersPage, OrdersPageRequest, ProductRef,
        ShopMetadata, VariantDetail,
    },
    error::{Error, Result},
};
