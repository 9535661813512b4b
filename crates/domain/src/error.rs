//! Domain error types.

use common::EntityId;
use snapshot_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the snapshot store.
    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: EntityId,
    },

    /// A stored record failed validation and the error policy skipped it.
    #[error("Stored {entity_type} {id} could not be restored")]
    Unrestorable {
        entity_type: &'static str,
        id: EntityId,
    },

    /// Guests exist only on the orders they place.
    #[error("Guest customers cannot be saved")]
    GuestCustomer,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
