//! In-memory snapshot store for testing and single-process use.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::StoredPack;
use crate::ports::{BoxError, SnapshotStore};
use crate::snapshot::Snapshot;
use crate::types::{ContextPackId, Meta};

/// In-memory snapshot store.
///
/// Uses a BTreeMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    packs: RwLock<BTreeMap<ContextPackId, StoredPack>>,
    saves: AtomicUsize,
    tenant_id: Option<String>,
}

impl InMemorySnapshotStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that stamps every record with `tenant_id`.
    pub fn with_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Self::default()
        }
    }

    /// Fetch a stored pack.
    pub fn get(&self, id: &ContextPackId) -> Option<StoredPack> {
        self.packs.read().get(id).cloned()
    }

    /// Number of distinct packs.
    pub fn len(&self) -> usize {
        self.packs.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.packs.read().is_empty()
    }

    /// Number of `save` calls, including repeated saves of the same id.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// All stored ids, in order.
    pub fn ids(&self) -> Vec<ContextPackId> {
        self.packs.read().keys().cloned().collect()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, id: &ContextPackId, snapshot: &Snapshot, meta: &Meta) -> Result<(), BoxError> {
        let now = Utc::now();
        let payload = snapshot.to_view();

        let mut packs = self.packs.write();
        let created_at = packs.get(id).map(|p| p.created_at).unwrap_or(now);
        packs.insert(
            id.clone(),
            StoredPack {
                id: id.clone(),
                tenant_id: self.tenant_id.clone(),
                payload,
                meta: meta.clone(),
                created_at,
                updated_at: now,
            },
        );
        drop(packs);

        self.saves.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(context_pack_id = %id, "Snapshot saved");
        Ok(())
    }
}
