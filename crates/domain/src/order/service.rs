//! Order service loading and persisting orders through a snapshot store.

use chrono::Utc;
use common::EntityId;
use snapshot_store::{SnapshotStore, SnapshotStoreExt};

use crate::config::OrderConfig;
use crate::error::DomainError;

use super::{Order, OrderSnapshot};

/// Entity type under which orders are stored.
pub const ORDER_ENTITY: &str = "Order";

/// Service for managing orders.
///
/// Orders are kept as flat snapshots; loading one builds a fresh order from
/// the configuration and restores the snapshot into it.
pub struct OrderService<S: SnapshotStore> {
    store: S,
    config: OrderConfig,
}

impl<S: SnapshotStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S, config: OrderConfig) -> Self {
        Self { store, config }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    /// Returns a new, unsaved order.
    pub fn create(&self) -> Order {
        Order::from_config(&self.config)
    }

    /// Places an order: gives it an id and a number, then saves it.
    ///
    /// The number defaults to the id; an existing number is kept.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn place(&self, order: &mut Order) -> Result<(), DomainError> {
        self.assign_id(order).await?;
        if order.number().is_none() {
            order.set_number(order.id().to_string())?;
        }
        self.save(order).await?;

        tracing::info!(
            order_id = %order.id(),
            number = order.number().unwrap_or_default(),
            total = %order.total(),
            "order placed"
        );
        Ok(())
    }

    /// Saves an order, allocating an id if it has none yet.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn save(&self, order: &mut Order) -> Result<(), DomainError> {
        self.assign_id(order).await?;
        order.set_updated_at(Utc::now());

        let snapshot = self
            .store
            .put_state(ORDER_ENTITY, order.id(), &order.state_to_save())
            .await?;

        metrics::counter!("orders_saved_total").increment(1);
        tracing::debug!(revision = snapshot.revision, "order saved");
        Ok(())
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, id: EntityId) -> Result<Option<Order>, DomainError> {
        match self.store.get_state::<OrderSnapshot>(ORDER_ENTITY, id).await? {
            Some(snapshot) => Ok(Some(self.restore(id, snapshot)?)),
            None => Ok(None),
        }
    }

    /// Loads an order by id, failing if it does not exist.
    pub async fn get(&self, id: EntityId) -> Result<Order, DomainError> {
        self.find(id).await?.ok_or(DomainError::NotFound {
            entity_type: ORDER_ENTITY,
            id,
        })
    }

    /// Loads every stored order, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Order>, DomainError> {
        let mut orders = Vec::new();
        for snapshot in self.store.list(ORDER_ENTITY).await? {
            let id = snapshot.entity_id;
            orders.push(self.restore(id, snapshot.into_state()?)?);
        }
        Ok(orders)
    }

    /// Deletes an order; returns whether anything was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<bool, DomainError> {
        Ok(self.store.remove(ORDER_ENTITY, id).await?)
    }

    async fn assign_id(&self, order: &mut Order) -> Result<(), DomainError> {
        if !order.id().is_assigned() {
            let id = self.store.next_id(ORDER_ENTITY).await?;
            order.set_id(id);
        }
        Ok(())
    }

    fn restore(&self, id: EntityId, snapshot: OrderSnapshot) -> Result<Order, DomainError> {
        let mut order = self.create();
        if !order.restore_state(snapshot)? {
            return Err(DomainError::Unrestorable {
                entity_type: ORDER_ENTITY,
                id,
            });
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use snapshot_store::InMemorySnapshotStore;

    use super::*;
    use crate::config::ErrorMode;
    use crate::order::{LineItem, Money, OrderStatus, Product};
    use crate::shipping::FlatRate;
    use crate::tax::TaxRates;

    fn service() -> OrderService<InMemorySnapshotStore> {
        let config = OrderConfig {
            error_mode: ErrorMode::Strict,
            ..OrderConfig::default()
        };
        OrderService::new(InMemorySnapshotStore::new(), config)
    }

    fn filled_order(service: &OrderService<InMemorySnapshotStore>) -> Order {
        let taxes = TaxRates::new().with_rate("standard", Decimal::new(10, 2));
        let product = Product::new(7, "Lamp", Money::from_cents(1000)).with_tax_class("standard");

        let mut order = service.create();
        order
            .add_item(LineItem::priced(product, 2, &taxes))
            .unwrap();
        order.set_shipping_method(
            Arc::new(FlatRate::per_order(Money::from_cents(500)).with_tax_class("standard")),
            &taxes,
        );
        order
    }

    #[tokio::test]
    async fn test_place_assigns_id_and_number() {
        let service = service();
        let mut order = filled_order(&service);

        service.place(&mut order).await.unwrap();

        assert_eq!(order.id(), EntityId::new(1));
        assert_eq!(order.number(), Some("1"));
        assert!(service.store().exists(ORDER_ENTITY, order.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_place_keeps_existing_number() {
        let service = service();
        let mut order = service.create();
        order.set_number("A-100").unwrap();

        service.place(&mut order).await.unwrap();

        assert_eq!(order.number(), Some("A-100"));
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let service = service();
        let mut order = filled_order(&service);
        order.set_status(OrderStatus::Processing, "Paid");
        service.save(&mut order).await.unwrap();

        let loaded = service.find(order.id()).await.unwrap().unwrap();

        assert_eq!(loaded.id(), order.id());
        assert_eq!(loaded.total(), Money::from_cents(2750));
        assert_eq!(loaded.subtotal(), order.subtotal());
        assert_eq!(loaded.tax(), order.tax());
        assert_eq!(loaded.shipping_tax(), order.shipping_tax());
        assert_eq!(loaded.status(), OrderStatus::Processing);
        assert_eq!(loaded.status_history(), order.status_history());
        assert!(loaded.has_shipping_method(FlatRate::ID));
    }

    #[tokio::test]
    async fn test_find_missing_order() {
        let service = service();
        assert!(service.find(EntityId::new(42)).await.unwrap().is_none());

        let error = service.get(EntityId::new(42)).await.unwrap_err();
        assert!(matches!(error, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stored_total_is_ignored_on_load() {
        let service = service();
        let mut order = filled_order(&service);
        service.save(&mut order).await.unwrap();

        let mut state = order.state_to_save().to_value().unwrap();
        state["total"] = serde_json::json!(1.0);
        service
            .store()
            .put(ORDER_ENTITY, order.id(), state)
            .await
            .unwrap();

        let loaded = service.get(order.id()).await.unwrap();
        assert_eq!(loaded.total(), Money::from_cents(2750));
    }

    #[tokio::test]
    async fn test_lenient_load_of_inconsistent_record_fails() {
        let config = OrderConfig {
            error_mode: ErrorMode::Lenient,
            ..OrderConfig::default()
        };
        let service = OrderService::new(InMemorySnapshotStore::new(), config);
        let id = EntityId::new(7);
        service
            .store()
            .put(
                ORDER_ENTITY,
                id,
                serde_json::json!({
                    "number": "7",
                    "subtotal": 50.0,
                    "shipping": {"method": false, "price": 5.0}
                }),
            )
            .await
            .unwrap();

        let error = service.find(id).await.unwrap_err();
        assert!(matches!(error, DomainError::Unrestorable { id: failed, .. } if failed == id));
        assert!(matches!(
            service.find_all().await,
            Err(DomainError::Unrestorable { .. })
        ));
        assert_eq!(service.store().record_count().await, 1);
    }

    #[tokio::test]
    async fn test_find_all_and_delete() {
        let service = service();
        for _ in 0..3 {
            let mut order = filled_order(&service);
            service.place(&mut order).await.unwrap();
        }

        let orders = service.find_all().await.unwrap();
        let ids: Vec<u64> = orders.iter().map(|o| o.id().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(service.delete(EntityId::new(2)).await.unwrap());
        assert!(!service.delete(EntityId::new(2)).await.unwrap());
        assert_eq!(service.find_all().await.unwrap().len(), 2);
    }
}
