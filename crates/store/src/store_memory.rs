//! In-memory stores for testing.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    Result,
    store::{MetaStore, TenantDirectory},
    types::Tenant,
};

/// Meta store backed by a `Mutex<HashMap>`. Nothing survives the process;
/// tests only.
#[derive(Default)]
pub struct MemoryMetaStore {
    entries: Mutex<HashMap<(String, String, String), String>>,
}

impl MemoryMetaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot(kind: &str, id: &str, key: &str) -> (String, String, String) {
    (kind.to_string(), id.to_string(), key.to_string())
}

#[async_trait]
impl MetaStore for MemoryMetaStore {
    async fn get(&self, kind: &str, id: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(&slot(kind, id, key)).cloned())
    }

    async fn set(&self, kind: &str, id: &str, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(slot(kind, id, key), value.to_string());
        Ok(())
    }

    async fn compare_and_set(
        &self,
        kind: &str,
        id: &str,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slot(kind, id, key);
        if entries.get(&slot).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(slot, value.to_string());
        Ok(true)
    }
}

/// Tenant directory held in memory; tests only.
#[derive(Default)]
pub struct MemoryTenantDirectory {
    tenants: Mutex<HashMap<String, Tenant>>,
}

impl MemoryTenantDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantDirectory for MemoryTenantDirectory {
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>> {
        let tenants = self.tenants.lock().unwrap_or_else(|e| e.into_inner());
        Ok(tenants.values().find(|t| t.shop_domain == domain).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>> {
        let tenants = self.tenants.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Tenant> = tenants.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn upsert(&self, tenant: &Tenant) -> Result<()> {
        let mut tenants = self.tenants.lock().unwrap_or_else(|e| e.into_inner());
        tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn make_tenant(id: &str, domain: &str) -> Tenant {
        Tenant {
            id: id.into(),
            shop_domain: domain.into(),
            access_token: format!("shptoken-{id}"),
        }
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let store = MemoryMetaStore::new();
        store.set("shop", "1", "moneyFormat", "${{amount}}").await.unwrap();
        assert_eq!(
            store.get("shop", "1", "moneyFormat").await.unwrap(),
            Some("${{amount}}".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_absent() {
        let store = MemoryMetaStore::new();
        assert_eq!(store.get("shop", "1", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scoping_by_tenant() {
        let store = MemoryMetaStore::new();
        store.set("shop", "1", "k", "one").await.unwrap();
        store.set("shop", "2", "k", "two").await.unwrap();
        assert_eq!(store.get("shop", "1", "k").await.unwrap().as_deref(), Some("one"));
        assert_eq!(store.get("shop", "2", "k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_cas_absent_key() {
        let store = MemoryMetaStore::new();
        assert!(store.compare_and_set("shop", "1", "k", None, "v1").await.unwrap());
        assert_eq!(store.get("shop", "1", "k").await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_cas_mismatch_leaves_value() {
        let store = MemoryMetaStore::new();
        store.set("shop", "1", "k", "v1").await.unwrap();
        assert!(!store.compare_and_set("shop", "1", "k", Some("stale"), "v2").await.unwrap());
        assert!(!store.compare_and_set("shop", "1", "k", None, "v2").await.unwrap());
        assert_eq!(store.get("shop", "1", "k").await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_cas_match_replaces() {
        let store = MemoryMetaStore::new();
        store.set("shop", "1", "k", "v1").await.unwrap();
        assert!(store.compare_and_set("shop", "1", "k", Some("v1"), "v2").await.unwrap());
        assert_eq!(store.get("shop", "1", "k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_directory_find_and_list() {
        let dir = MemoryTenantDirectory::new();
        dir.upsert(&make_tenant("2", "beta.myshopify.com")).await.unwrap();
        dir.upsert(&make_tenant("1", "acme.myshopify.com")).await.unwrap();

        let found = dir.find_by_domain("acme.myshopify.com").await.unwrap();
        assert_eq!(found.unwrap().id, "1");
        assert!(dir.find_by_domain("ghost.myshopify.com").await.unwrap().is_none());

        let all = dir.list().await.unwrap();
        assert_eq!(all.len(), 2);
        // list() orders by id.
        assert_eq!(all[0].id, "1");
    }

    #[tokio::test]
    async fn test_directory_upsert_replaces() {
        let dir = MemoryTenantDirectory::new();
        dir.upsert(&make_tenant("1", "acme.myshopify.com")).await.unwrap();
        let mut updated = make_tenant("1", "acme.myshopify.com");
        updated.access_token = "rotated".into();
        dir.upsert(&updated).await.unwrap();

        let all = dir.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].access_token, "rotated");
    }
}
