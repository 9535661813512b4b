//! Order aggregate and related types.

mod aggregate;
mod item;
mod ledger;
mod service;
mod snapshot;
mod status;
mod value_objects;

pub use aggregate::{Order, QuantityChange};
pub use item::{LineItem, Product};
pub use ledger::TaxLedger;
pub use service::{ORDER_ENTITY, OrderService};
pub use snapshot::{OrderSnapshot, ShippingSnapshot};
pub use status::{OrderStatus, StatusChange};
pub use value_objects::Money;

use common::{EntityId, ItemKey};
use thiserror::Error;

/// Broad classification of order errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced item does not exist.
    NotFound,
    /// An argument is malformed.
    InvalidArgument,
    /// The operation would break an invariant of the order.
    InvalidState,
}

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// Item not found in order.
    #[error("No item with key {key} in order {order_id}")]
    ItemNotFound { key: ItemKey, order_id: EntityId },

    /// Quantity is not a whole number, or is out of range.
    #[error("Invalid quantity: {value}")]
    InvalidQuantity { value: String },

    /// The order number is immutable once assigned.
    #[error("Order number already assigned: {current}")]
    NumberAlreadyAssigned { current: String },

    /// State can only be restored into an order without items.
    #[error("Cannot restore into an order that already has {items} items")]
    AlreadyPopulated { items: usize },

    /// The snapshot is structurally inconsistent.
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },
}

impl OrderError {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::ItemNotFound { .. } => ErrorKind::NotFound,
            OrderError::InvalidQuantity { .. } => ErrorKind::InvalidArgument,
            OrderError::NumberAlreadyAssigned { .. }
            | OrderError::AlreadyPopulated { .. }
            | OrderError::InvalidSnapshot { .. } => ErrorKind::InvalidState,
        }
    }
}
