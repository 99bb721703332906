//! Inbound webhook verification, routing, and per-topic event handling.
//!
//! The gateway verifies a request's HMAC signature against the raw body,
//! parses the topic header into [`WebhookTopic`], and dispatches the JSON
//! payload plus the tenant's resolved chat configuration to the matching
//! handler. Unknown topics are acknowledged without dispatch.

pub mod format;
pub mod handlers;
pub mod payload;
pub mod signature;
pub mod topic;

pub use {
    handlers::{
        DispatchConfig, HandlerRegistry, HandlerResult, OrderCreatedHandler,
        VariantOutOfStockHandler, WebhookHandler,
    },
    payload::{OrderCreatedPayload, OrderLineItem, ShippingAddress, VariantOutOfStockPayload},
    signature::{sign, verify_signature},
    topic::WebhookTopic,
};
