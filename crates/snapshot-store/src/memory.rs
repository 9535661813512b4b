use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{EntityId, Result, Snapshot, StoreError, store::SnapshotStore};

/// In-memory snapshot store.
///
/// Records are grouped by entity type and ordered by id. Cloning the store
/// shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    records: Arc<RwLock<HashMap<String, BTreeMap<EntityId, Snapshot>>>>,
    sequences: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemorySnapshotStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.values().map(BTreeMap::len).sum()
    }

    /// Clears all records. Id sequences keep counting.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn next_id(&self, entity_type: &str) -> Result<EntityId> {
        let mut sequences = self.sequences.write().await;
        let next = sequences.entry(entity_type.to_string()).or_insert(0);
        *next += 1;
        Ok(EntityId::new(*next))
    }

    async fn put(
        &self,
        entity_type: &str,
        entity_id: EntityId,
        state: serde_json::Value,
    ) -> Result<Snapshot> {
        if !entity_id.is_assigned() {
            return Err(StoreError::UnassignedId {
                entity_type: entity_type.to_string(),
            });
        }

        let mut records = self.records.write().await;
        let by_id = records.entry(entity_type.to_string()).or_default();

        let revision = by_id
            .get(&entity_id)
            .map(|previous| previous.revision + 1)
            .unwrap_or(1);

        let snapshot = Snapshot::new(entity_id, entity_type, revision, state);
        by_id.insert(entity_id, snapshot.clone());

        tracing::debug!(entity_type, %entity_id, revision, "snapshot stored");
        Ok(snapshot)
    }

    async fn get(&self, entity_type: &str, entity_id: EntityId) -> Result<Option<Snapshot>> {
        let records = self.records.read().await;
        Ok(records
            .get(entity_type)
            .and_then(|by_id| by_id.get(&entity_id))
            .cloned())
    }

    async fn list(&self, entity_type: &str) -> Result<Vec<Snapshot>> {
        let records = self.records.read().await;
        Ok(records
            .get(entity_type)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, entity_type: &str, entity_id: EntityId) -> Result<bool> {
        let mut records = self.records.write().await;
        Ok(records
            .get_mut(entity_type)
            .and_then(|by_id| by_id.remove(&entity_id))
            .is_some())
    }
}
