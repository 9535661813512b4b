//! Customers and their tax jurisdictions.

mod model;
mod service;

pub use model::{Customer, RegisteredCustomer, TaxLocation};
pub use service::{CUSTOMER_ENTITY, CustomerService};
