//! Tenant records and the per-tenant meta store.
//!
//! Everything the dashboard writes (chat authorization, notification
//! settings) and everything the schedulers stamp (dedup timestamps, the
//! low-stock ledger) lives behind [`store::MetaStore`], keyed per tenant.

pub mod error;
pub mod keys;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod tenant_meta;
pub mod types;

pub use {
    error::{Error, Result},
    store::{MetaStore, TenantDirectory},
    store_memory::{MemoryMetaStore, MemoryTenantDirectory},
    store_sqlite::{SqliteMetaStore, SqliteTenantDirectory},
    tenant_meta::TenantMeta,
    types::{
        ChannelRef, ChatConnection, LowStockLedger, NotificationSetting, NotificationType, Team,
        Tenant,
    },
};

/// Run database migrations for the store crate.
///
/// This creates the `tenants` and `meta` tables. Should be called at
/// application startup when using the SQLite-backed stores with a shared pool.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
