use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// The persisted flat state of one entity.
///
/// Each save replaces the previous record for the same entity
/// (last write wins) and bumps its revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The entity this record belongs to.
    pub entity_id: EntityId,

    /// The type of entity (e.g., "Order", "Customer").
    pub entity_type: String,

    /// Number of times this entity has been written.
    pub revision: u64,

    /// When the record was written.
    pub timestamp: DateTime<Utc>,

    /// The serialized entity state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a record at the given revision, stamped now.
    pub fn new(
        entity_id: EntityId,
        entity_type: impl Into<String>,
        revision: u64,
        state: serde_json::Value,
    ) -> Self {
        Self {
            entity_id,
            entity_type: entity_type.into(),
            revision,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Deserializes the record state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestState {
        value: i32,
        name: String,
    }

    #[test]
    fn snapshot_new_keeps_revision_and_state() {
        let state = serde_json::json!({"value": 42});
        let snapshot = Snapshot::new(EntityId::new(3), "Order", 4, state.clone());

        assert_eq!(snapshot.entity_id, EntityId::new(3));
        assert_eq!(snapshot.entity_type, "Order");
        assert_eq!(snapshot.revision, 4);
        assert_eq!(snapshot.state, state);
    }

    #[test]
    fn snapshot_into_state() {
        let original = TestState {
            value: 42,
            name: "test".to_string(),
        };
        let state = serde_json::to_value(&original).unwrap();

        let restored: TestState = Snapshot::new(EntityId::new(5), "Customer", 1, state)
            .into_state()
            .unwrap();
        assert_eq!(restored, original);
    }
}
