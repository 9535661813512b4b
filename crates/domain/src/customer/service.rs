//! Customer lookup and persistence.

use common::EntityId;
use snapshot_store::{SnapshotStore, SnapshotStoreExt};

use crate::error::DomainError;

use super::{Customer, RegisteredCustomer};

/// Entity type under which registered customers are stored.
pub const CUSTOMER_ENTITY: &str = "Customer";

/// Service for looking up and saving customers.
///
/// Only registered customers are stored. The unassigned id always
/// resolves to a guest.
pub struct CustomerService<S: SnapshotStore> {
    store: S,
}

impl<S: SnapshotStore> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Finds a customer by id.
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, id: EntityId) -> Result<Customer, DomainError> {
        if !id.is_assigned() {
            return Ok(Customer::guest());
        }

        self.store
            .get_state::<RegisteredCustomer>(CUSTOMER_ENTITY, id)
            .await?
            .map(Customer::Registered)
            .ok_or(DomainError::NotFound {
                entity_type: CUSTOMER_ENTITY,
                id,
            })
    }

    /// Returns a guest followed by every registered customer.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Customer>, DomainError> {
        let mut customers = vec![Customer::guest()];
        for snapshot in self.store.list(CUSTOMER_ENTITY).await? {
            customers.push(Customer::Registered(snapshot.into_state()?));
        }
        Ok(customers)
    }

    /// Saves a registered customer, allocating an id if it has none.
    #[tracing::instrument(skip(self, customer))]
    pub async fn save(&self, customer: &mut Customer) -> Result<EntityId, DomainError> {
        let Customer::Registered(registered) = customer else {
            return Err(DomainError::GuestCustomer);
        };

        if !registered.id.is_assigned() {
            registered.id = self.store.next_id(CUSTOMER_ENTITY).await?;
        }
        self.store
            .put_state(CUSTOMER_ENTITY, registered.id, &*registered)
            .await?;

        metrics::counter!("customers_saved_total").increment(1);
        tracing::debug!(customer_id = %registered.id, login = %registered.login, "customer saved");
        Ok(registered.id)
    }
}
