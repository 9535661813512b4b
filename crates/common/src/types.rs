use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Numeric identifier of a persisted entity (order, customer).
///
/// Identifiers are allocated by the persistence layer; `0` is reserved
/// for entities that have never been stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// The identifier of an entity that was never persisted.
    pub const UNASSIGNED: EntityId = EntityId(0);

    /// Creates an entity ID from a raw number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw number.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Returns true if the persistence layer has assigned this ID.
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Namespace for item keys derived from product identity.
const ITEM_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_4c2e_9b3d_5e70_8f12_a4c6_d8e0_f213);

/// Key of a line item within an order.
///
/// Distinct from the product id so that the same product can appear more
/// than once (different variations). Keys derived with [`ItemKey::for_product`]
/// are deterministic: the same product and variation attributes always yield
/// the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(Uuid);

impl ItemKey {
    /// Derives the key for a product and its variation attributes.
    ///
    /// Every attribute and value is length-prefixed in the hashed name, so
    /// no choice of separators inside them can make two variations collide.
    pub fn for_product(product_id: EntityId, variation: &BTreeMap<String, String>) -> Self {
        let mut name = product_id.to_string();
        for part in variation.iter().flat_map(|(attribute, value)| [attribute, value]) {
            name.push_str(&format!(";{}:{part}", part.len()));
        }
        Self(Uuid::new_v5(&ITEM_KEY_NAMESPACE, name.as_bytes()))
    }

    /// Creates a random key, for entries that have no product identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
