//! Shared state threaded through every route.

use std::sync::Arc;

use {
    merchbell_chat::SlackClient,
    merchbell_commerce::CommerceClient,
    merchbell_config::MerchbellConfig,
    merchbell_digest::NotificationScheduler,
    merchbell_store::{MetaStore, TenantDirectory},
    merchbell_webhooks::HandlerRegistry,
};

pub struct GatewayState {
    pub store: Arc<dyn MetaStore>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub registry: HandlerRegistry,
    pub scheduler: NotificationScheduler,
    /// Shared secret webhook signatures are verified against.
    pub shared_secret: String,
}

impl GatewayState {
    #[must_use]
    pub fn new(
        store: Arc<dyn MetaStore>,
        tenants: Arc<dyn TenantDirectory>,
        chat: Arc<SlackClient>,
        commerce: Arc<CommerceClient>,
        config: &MerchbellConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: HandlerRegistry::new(Arc::clone(&chat), Arc::clone(&commerce)),
            scheduler: NotificationScheduler::new(
                Arc::clone(&store),
                Arc::clone(&tenants),
                chat,
                commerce,
                &config.digest,
            ),
            shared_secret: config.commerce.shared_secret_value(),
            store,
            tenants,
        })
    }
}
