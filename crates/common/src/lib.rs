//! Identifier types shared by the store and domain crates.

pub mod types;

pub use types::{EntityId, ItemKey};
