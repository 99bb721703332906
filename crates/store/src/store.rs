//! Persistence traits for tenant records and per-tenant metadata.

use async_trait::async_trait;

use crate::{Result, types::Tenant};

/// Per-tenant string key/value store scoped by `(entity_kind, entity_id, key)`.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn get(&self, kind: &str, id: &str, key: &str) -> Result<Option<String>>;

    async fn set(&self, kind: &str, id: &str, key: &str, value: &str) -> Result<()>;

    /// Atomically replace the value only when it currently equals `expected`
    /// (`None` = the key must be absent). Returns whether the write happened.
    async fn compare_and_set(
        &self,
        kind: &str,
        id: &str,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool>;
}

/// Directory of connected tenants.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>>;

    /// All connected tenants, ordered by id.
    async fn list(&self) -> Result<Vec<Tenant>>;

    async fn upsert(&self, tenant: &Tenant) -> Result<()>;
}
