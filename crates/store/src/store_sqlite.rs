//! SQLite-backed stores using sqlx.

use {
    async_trait::async_trait,
    sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions},
};

use crate::{
    Result,
    error::Context,
    store::{MetaStore, TenantDirectory},
    types::Tenant,
};

async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to SQLite")?;
    crate::run_migrations(&pool).await?;
    Ok(pool)
}

/// SQLite-backed meta store.
pub struct SqliteMetaStore {
    pool: SqlitePool,
}

impl SqliteMetaStore {
    /// Create a new store with its own connection pool and run migrations.
    ///
    /// For shared pools (one database file for the whole process), use
    /// [`SqliteMetaStore::with_pool`] after calling [`crate::run_migrations`].
    pub async fn new(database_url: &str) -> Result<Self> {
        Ok(Self {
            pool: connect(database_url).await?,
        })
    }

    /// Create a store using an existing pool (migrations must already be run).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetaStore for SqliteMetaStore {
    async fn get(&self, kind: &str, id: &str, key: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT value FROM meta WHERE entity_kind = ? AND entity_id = ? AND key = ?",
        )
        .bind(kind)
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, kind: &str, id: &str, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO meta (entity_kind, entity_id, key, value) VALUES (?, ?, ?, ?)
             ON CONFLICT(entity_kind, entity_id, key) DO UPDATE SET value = excluded.value",
        )
        .bind(kind)
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
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
        // Each arm is a single statement, so the check-and-write is atomic.
        let result = match expected {
            Some(expected) => {
                sqlx::query(
                    "UPDATE meta SET value = ?
                     WHERE entity_kind = ? AND entity_id = ? AND key = ? AND value = ?",
                )
                .bind(value)
                .bind(kind)
                .bind(id)
                .bind(key)
                .bind(expected)
                .execute(&self.pool)
                .await?
            },
            None => {
                sqlx::query(
                    "INSERT INTO meta (entity_kind, entity_id, key, value) VALUES (?, ?, ?, ?)
                     ON CONFLICT(entity_kind, entity_id, key) DO NOTHING",
                )
                .bind(kind)
                .bind(id)
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?
            },
        };
        Ok(result.rows_affected() == 1)
    }
}

/// SQLite-backed tenant directory.
pub struct SqliteTenantDirectory {
    pool: SqlitePool,
}

impl SqliteTenantDirectory {
    /// Create a new directory with its own connection pool and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        Ok(Self {
            pool: connect(database_url).await?,
        })
    }

    /// Create a directory using an existing pool (migrations must already be run).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn tenant_from_row(row: &sqlx::sqlite::SqliteRow) -> Tenant {
    Tenant {
        id: row.get("id"),
        shop_domain: row.get("shop_domain"),
        access_token: row.get("access_token"),
    }
}

#[async_trait]
impl TenantDirectory for SqliteTenantDirectory {
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>> {
        let row =
            sqlx::query("SELECT id, shop_domain, access_token FROM tenants WHERE shop_domain = ?")
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.as_ref().map(tenant_from_row))
    }

    async fn list(&self) -> Result<Vec<Tenant>> {
        let rows = sqlx::query("SELECT id, shop_domain, access_token FROM tenants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(tenant_from_row).collect())
    }

    async fn upsert(&self, tenant: &Tenant) -> Result<()> {
        sqlx::query(
            "INSERT INTO tenants (id, shop_domain, access_token) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 shop_domain = excluded.shop_domain,
                 access_token = excluded.access_token",
        )
        .bind(&tenant.id)
        .bind(&tenant.shop_domain)
        .bind(&tenant.access_token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
