pub mod error;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use common::EntityId;
pub use error::{Result, StoreError};
pub use memory::InMemorySnapshotStore;
pub use snapshot::Snapshot;
pub use store::{SnapshotStore, SnapshotStoreExt};
