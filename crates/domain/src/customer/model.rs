//! Customer value objects.

use common::EntityId;
use serde::{Deserialize, Serialize};

/// The tax jurisdiction of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLocation {
    /// ISO country code.
    pub country: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

impl TaxLocation {
    /// Creates a location for a country.
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: None,
            postcode: None,
        }
    }
}

/// A customer with a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredCustomer {
    pub id: EntityId,
    pub login: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<TaxLocation>,
}

/// The customer an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Customer {
    /// Anonymous checkout.
    Guest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<TaxLocation>,
    },

    /// Customer with an account.
    Registered(RegisteredCustomer),
}

impl Customer {
    /// Returns a guest without a known location.
    pub fn guest() -> Self {
        Customer::Guest { location: None }
    }

    /// Returns a registered customer.
    pub fn registered(
        id: EntityId,
        login: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Customer::Registered(RegisteredCustomer {
            id,
            login: login.into(),
            email: email.into(),
            display_name: display_name.into(),
            location: None,
        })
    }

    /// Sets the tax location.
    pub fn with_location(mut self, new_location: TaxLocation) -> Self {
        match &mut self {
            Customer::Guest { location } => *location = Some(new_location),
            Customer::Registered(customer) => customer.location = Some(new_location),
        }
        self
    }

    /// Returns the customer id; guests have the unassigned id.
    pub fn id(&self) -> EntityId {
        match self {
            Customer::Guest { .. } => EntityId::UNASSIGNED,
            Customer::Registered(customer) => customer.id,
        }
    }

    /// Returns true for anonymous customers.
    pub fn is_guest(&self) -> bool {
        matches!(self, Customer::Guest { .. })
    }

    /// Returns the tax location, if known.
    pub fn location(&self) -> Option<&TaxLocation> {
        match self {
            Customer::Guest { location } => location.as_ref(),
            Customer::Registered(customer) => customer.location.as_ref(),
        }
    }
}

impl Default for Customer {
    fn default() -> Self {
        Self::guest()
    }
}
