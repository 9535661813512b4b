//! Flat persisted form of an order.

use std::collections::BTreeMap;

use common::EntityId;
use serde::{Deserialize, Serialize};

use super::{LineItem, Money, OrderStatus, StatusChange};
use crate::customer::Customer;
use crate::shipping::ShippingMethodState;

/// The flat state of an order, as written to and read from storage.
///
/// Every field is optional so that partial records can be restored; fields
/// that are absent leave the order's constructed defaults untouched.
/// Optional selections (shipping method, payment method) are stored as
/// `false` when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Unix timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Unix timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Unix timestamp, `0` when the order was never completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingSnapshot>,
    #[serde(with = "false_or")]
    pub payment: Option<String>,
    pub customer_note: Option<String>,
    /// Informational only; restore always recomputes the total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_subtotal: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_tax: Option<BTreeMap<String, Money>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_messages: Option<Vec<StatusChange>>,
}

impl OrderSnapshot {
    /// Parses a snapshot from its JSON form.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns the JSON form of the snapshot.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Persisted shipping selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
    #[serde(default, with = "false_or")]
    pub method: Option<ShippingMethodState>,
    #[serde(default)]
    pub price: Money,
}

/// Serializes `None` as `false`; accepts `false`, `null` or a value.
mod false_or {
    use serde::de::{self, DeserializeOwned};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FalseOr<T> {
        Flag(bool),
        Value(T),
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        match Option::<FalseOr<T>>::deserialize(deserializer)? {
            None | Some(FalseOr::Flag(false)) => Ok(None),
            Some(FalseOr::Flag(true)) => Err(de::Error::custom("expected `false` or a value")),
            Some(FalseOr::Value(value)) => Ok(Some(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_is_a_valid_snapshot() {
        let snapshot = OrderSnapshot::from_value(serde_json::json!({})).unwrap();
        assert_eq!(snapshot, OrderSnapshot::default());
    }

    #[test]
    fn test_unset_selections_are_stored_as_false() {
        let snapshot = OrderSnapshot {
            shipping: Some(ShippingSnapshot::default()),
            ..OrderSnapshot::default()
        };
        let value = snapshot.to_value().unwrap();
        assert_eq!(value["payment"], false);
        assert_eq!(value["shipping"]["method"], false);
        assert_eq!(value["shipping"]["price"], 0.0);
    }

    #[test]
    fn test_selections_accept_false_null_or_value() {
        let snapshot = OrderSnapshot::from_value(serde_json::json!({
            "payment": "cheque",
            "shipping": {"method": {"method": "local_pickup"}, "price": 0.0}
        }))
        .unwrap();
        assert_eq!(snapshot.payment.as_deref(), Some("cheque"));
        assert_eq!(
            snapshot.shipping.unwrap().method,
            Some(ShippingMethodState::LocalPickup)
        );

        let snapshot = OrderSnapshot::from_value(serde_json::json!({
            "payment": null,
            "shipping": {"method": false, "price": 5.0}
        }))
        .unwrap();
        assert!(snapshot.payment.is_none());
        assert!(snapshot.shipping.unwrap().method.is_none());
    }

    #[test]
    fn test_true_is_not_a_selection() {
        let result = OrderSnapshot::from_value(serde_json::json!({"payment": true}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_shipping_method_is_rejected() {
        let result = OrderSnapshot::from_value(serde_json::json!({
            "shipping": {"method": {"method": "teleport"}, "price": 1.0}
        }));
        assert!(result.is_err());
    }
}
