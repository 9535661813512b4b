use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{EntityId, Result, Snapshot};

/// Core trait for snapshot store implementations.
///
/// The store keeps one flat state record per entity. Writes are
/// last-write-wins; locking around concurrent writers of the same entity
/// is the caller's concern. All implementations must be thread-safe.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Allocates a fresh identifier for an entity type.
    ///
    /// Identifiers start at 1 and are never reused.
    async fn next_id(&self, entity_type: &str) -> Result<EntityId>;

    /// Writes the state of an entity, replacing any previous record.
    ///
    /// Returns the stored record with its new revision.
    async fn put(
        &self,
        entity_type: &str,
        entity_id: EntityId,
        state: serde_json::Value,
    ) -> Result<Snapshot>;

    /// Retrieves the record of an entity.
    ///
    /// Returns None if the entity was never stored or has been removed.
    async fn get(&self, entity_type: &str, entity_id: EntityId) -> Result<Option<Snapshot>>;

    /// Lists all records of an entity type ordered by id.
    async fn list(&self, entity_type: &str) -> Result<Vec<Snapshot>>;

    /// Removes the record of an entity.
    ///
    /// Returns false if there was nothing to remove.
    async fn remove(&self, entity_type: &str, entity_id: EntityId) -> Result<bool>;
}

/// Extension trait providing typed convenience methods for snapshot stores.
#[async_trait]
pub trait SnapshotStoreExt: SnapshotStore {
    /// Serializes and writes an entity state.
    async fn put_state<T: Serialize + Sync>(
        &self,
        entity_type: &str,
        entity_id: EntityId,
        state: &T,
    ) -> Result<Snapshot> {
        let value = serde_json::to_value(state)?;
        self.put(entity_type, entity_id, value).await
    }

    /// Reads and deserializes an entity state.
    async fn get_state<T: DeserializeOwned>(
        &self,
        entity_type: &str,
        entity_id: EntityId,
    ) -> Result<Option<T>> {
        match self.get(entity_type, entity_id).await? {
            Some(snapshot) => Ok(Some(snapshot.into_state()?)),
            None => Ok(None),
        }
    }

    /// Checks if an entity has a stored record.
    async fn exists(&self, entity_type: &str, entity_id: EntityId) -> Result<bool> {
        Ok(self.get(entity_type, entity_id).await?.is_some())
    }
}

// Blanket implementation for all SnapshotStore implementations
impl<T: SnapshotStore + ?Sized> SnapshotStoreExt for T {}
