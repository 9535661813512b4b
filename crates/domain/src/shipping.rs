//! Shipping methods.
//!
//! A [`ShippingMethod`] prices shipping for an order and declares the tax
//! classes its price is taxed under. Its persisted form is the tagged
//! [`ShippingMethodState`], which converts back into a live method when an
//! order is restored.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::order::{Money, Order};

/// A way of shipping an order.
pub trait ShippingMethod: Debug + Send + Sync {
    /// Returns the method identifier.
    fn id(&self) -> &str;

    /// Computes the shipping price for an order.
    fn calculate(&self, order: &Order) -> Money;

    /// Returns the tax classes the shipping price is taxed under.
    fn tax_classes(&self) -> BTreeSet<String>;

    /// Returns the persisted form of the method.
    fn state(&self) -> ShippingMethodState;

    /// Returns true if the method can be offered for the order.
    fn is_available(&self, _order: &Order) -> bool {
        true
    }
}

/// Persisted form of a shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ShippingMethodState {
    FlatRate {
        cost: Money,
        #[serde(default)]
        per_item: bool,
        #[serde(default)]
        tax_classes: BTreeSet<String>,
    },
    FreeShipping {
        #[serde(default)]
        minimum: Money,
    },
    LocalPickup,
}

impl ShippingMethodState {
    /// Rebuilds the live method.
    pub fn into_method(self) -> Arc<dyn ShippingMethod> {
        match self {
            ShippingMethodState::FlatRate {
                cost,
                per_item,
                tax_classes,
            } => Arc::new(FlatRate {
                cost,
                per_item,
                tax_classes,
            }),
            ShippingMethodState::FreeShipping { minimum } => Arc::new(FreeShipping { minimum }),
            ShippingMethodState::LocalPickup => Arc::new(LocalPickup),
        }
    }
}

/// Fixed cost per order, or per unit when `per_item` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRate {
    pub cost: Money,
    pub per_item: bool,
    pub tax_classes: BTreeSet<String>,
}

impl FlatRate {
    pub const ID: &'static str = "flat_rate";

    /// Creates a per-order flat rate.
    pub fn per_order(cost: Money) -> Self {
        Self {
            cost,
            per_item: false,
            tax_classes: BTreeSet::new(),
        }
    }

    /// Creates a rate charged for every unit in the order.
    pub fn per_item(cost: Money) -> Self {
        Self {
            per_item: true,
            ..Self::per_order(cost)
        }
    }

    /// Adds a tax class.
    pub fn with_tax_class(mut self, class: impl Into<String>) -> Self {
        self.tax_classes.insert(class.into());
        self
    }
}

impl ShippingMethod for FlatRate {
    fn id(&self) -> &str {
        Self::ID
    }

    fn calculate(&self, order: &Order) -> Money {
        if self.per_item {
            self.cost.multiply(order.total_quantity())
        } else {
            self.cost
        }
    }

    fn tax_classes(&self) -> BTreeSet<String> {
        self.tax_classes.clone()
    }

    fn state(&self) -> ShippingMethodState {
        ShippingMethodState::FlatRate {
            cost: self.cost,
            per_item: self.per_item,
            tax_classes: self.tax_classes.clone(),
        }
    }
}

/// Free shipping above a product subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FreeShipping {
    pub minimum: Money,
}

impl FreeShipping {
    pub const ID: &'static str = "free_shipping";
}

impl ShippingMethod for FreeShipping {
    fn id(&self) -> &str {
        Self::ID
    }

    fn calculate(&self, _order: &Order) -> Money {
        Money::zero()
    }

    fn tax_classes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn state(&self) -> ShippingMethodState {
        ShippingMethodState::FreeShipping {
            minimum: self.minimum,
        }
    }

    fn is_available(&self, order: &Order) -> bool {
        order.product_subtotal() >= self.minimum
    }
}

/// Collection from the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalPickup;

impl LocalPickup {
    pub const ID: &'static str = "local_pickup";
}

impl ShippingMethod for LocalPickup {
    fn id(&self) -> &str {
        Self::ID
    }

    fn calculate(&self, _order: &Order) -> Money {
        Money::zero()
    }

    fn tax_classes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn state(&self) -> ShippingMethodState {
        ShippingMethodState::LocalPickup
    }
}
