//! Order domain for a shop.
//!
//! This crate provides:
//! - The order aggregate, keeping totals and per-class tax incrementally
//! - Flat snapshots for saving and restoring orders
//! - Strict and lenient policies for precondition violations
//! - Services persisting orders and customers through a snapshot store

pub mod config;
pub mod customer;
pub mod error;
pub mod order;
pub mod policy;
pub mod shipping;
pub mod tax;
pub mod telemetry;

pub use config::{ErrorMode, OrderConfig};
pub use customer::{Customer, CustomerService, RegisteredCustomer, TaxLocation};
pub use error::DomainError;
pub use order::{
    ErrorKind, LineItem, Money, Order, OrderError, OrderService, OrderSnapshot, OrderStatus,
    Product, QuantityChange, ShippingSnapshot, StatusChange, TaxLedger,
};
pub use policy::{ErrorPolicy, LenientPolicy, StrictPolicy};
pub use shipping::{FlatRate, FreeShipping, LocalPickup, ShippingMethod, ShippingMethodState};
pub use tax::{TaxRates, TaxService};
