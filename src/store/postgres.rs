//! PostgreSQL snapshot store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//! - `GACS_PACK_TENANT_ID`: Tenant stamped on every record (optional)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Executor, Row};

use super::StoredPack;
use crate::ports::{BoxError, SnapshotStore};
use crate::snapshot::{Snapshot, SnapshotView};
use crate::types::{ContextPackId, Meta};

/// SQL schema for the context pack table.
pub const CONTEXT_PACKS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS context_packs (
    id TEXT PRIMARY KEY,
    tenant_id TEXT,
    payload JSONB NOT NULL,
    meta JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_context_packs_tenant ON context_packs(tenant_id);
"#;

/// Error type for the PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresStoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored row did not decode.
    #[error("Invalid stored pack {id}: {reason}")]
    InvalidRow {
        /// Row id.
        id: String,
        /// What was wrong.
        reason: String,
    },
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration for the PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStoreConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
    /// Tenant stamped on every saved pack.
    pub tenant_id: Option<String>,
}

impl PostgresStoreConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/gacs_pack".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
            tenant_id: std::env::var("GACS_PACK_TENANT_ID")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Default for PostgresStoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// PostgreSQL snapshot store backed by the `context_packs` table.
pub struct PostgresSnapshotStore {
    pool: PgPool,
    tenant_id: Option<String>,
}

impl PostgresSnapshotStore {
    /// Connect with the given configuration.
    pub async fn new(config: PostgresStoreConfig) -> Result<Self, PostgresStoreError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self::from_pool(pool, config.tenant_id))
    }

    /// Connect using environment variables.
    pub async fn from_env() -> Result<Self, PostgresStoreError> {
        Self::new(PostgresStoreConfig::from_env()).await
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, tenant_id: Option<String>) -> Self {
        Self { pool, tenant_id }
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `context_packs` table if missing.
    pub async fn migrate(&self) -> Result<(), PostgresStoreError> {
        self.pool.execute(CONTEXT_PACKS_TABLE_SCHEMA).await?;
        Ok(())
    }

    /// Check if the database is reachable.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Upsert a snapshot.
    pub async fn upsert(
        &self,
        id: &ContextPackId,
        snapshot: &Snapshot,
        meta: &Meta,
    ) -> Result<(), PostgresStoreError> {
        sqlx::query(
            r#"
            INSERT INTO context_packs (id, tenant_id, payload, meta, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE
            SET tenant_id = EXCLUDED.tenant_id,
                payload = EXCLUDED.payload,
                meta = EXCLUDED.meta,
                updated_at = NOW()
            "#,
        )
        .bind(id.as_str())
        .bind(self.tenant_id.as_deref())
        .bind(Json(snapshot.to_view()))
        .bind(Json(meta))
        .execute(&self.pool)
        .await?;

        tracing::debug!(context_pack_id = %id, "Snapshot upserted");
        Ok(())
    }

    /// Fetch a stored pack.
    pub async fn get(&self, id: &ContextPackId) -> Result<Option<StoredPack>, PostgresStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, payload, meta, created_at, updated_at
            FROM context_packs
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_row(&r)).transpose()
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> Result<StoredPack, PostgresStoreError> {
        let raw_id: String = row.try_get("id")?;
        let id = ContextPackId::parse(&raw_id).map_err(|e| PostgresStoreError::InvalidRow {
            id: raw_id.clone(),
            reason: e.to_string(),
        })?;
        let Json(payload): Json<SnapshotView> = row.try_get("payload")?;
        let Json(meta): Json<Meta> = row.try_get("meta")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(StoredPack {
            id,
            tenant_id: row.try_get("tenant_id")?,
            payload,
            meta,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn save(&self, id: &ContextPackId, snapshot: &Snapshot, meta: &Meta) -> Result<(), BoxError> {
        self.upsert(id, snapshot, meta).await.map_err(Into::into)
    }
}
