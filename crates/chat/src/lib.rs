//! Thin client for the chat workspace's Web API.
//!
//! Covers the four methods the integration needs: `conversations.join`,
//! `chat.postMessage`, `conversations.list`, and `oauth.v2.access`. Message
//! delivery is join-then-post; nothing here retries.

pub mod client;
pub mod error;

pub use {
    client::{Channel, OauthAccess, SlackClient},
    error::{Error, Result},
};
