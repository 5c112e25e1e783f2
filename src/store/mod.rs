//! Snapshot storage backends.
//!
//! Both backends implement [`SnapshotStore`](crate::ports::SnapshotStore) as
//! an idempotent upsert keyed by [`ContextPackId`]: saving the same id twice
//! leaves one record, with `created_at` from the first save.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotView;
use crate::types::{ContextPackId, Meta};

/// A persisted context pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPack {
    /// Content address.
    pub id: ContextPackId,
    /// Owning tenant, if the store is tenant-scoped.
    pub tenant_id: Option<String>,
    /// Full snapshot view.
    pub payload: SnapshotView,
    /// Meta passed to `save`.
    pub meta: Meta,
    /// First save.
    pub created_at: DateTime<Utc>,
    /// Most recent save.
    pub updated_at: DateTime<Utc>,
}

pub use memory::InMemorySnapshotStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresSnapshotStore, PostgresStoreConfig, PostgresStoreError, CONTEXT_PACKS_TABLE_SCHEMA};
