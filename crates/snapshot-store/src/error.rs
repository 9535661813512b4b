use thiserror::Error;

/// Errors that can occur when interacting with the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Records must carry an identifier allocated by the store.
    #[error("Cannot store {entity_type} without an assigned id")]
    UnassignedId { entity_type: String },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
