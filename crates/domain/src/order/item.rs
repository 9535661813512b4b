//! Line items and the product reference they carry.

use std::collections::{BTreeMap, BTreeSet};

use common::{EntityId, ItemKey};
use serde::{Deserialize, Serialize};

use super::Money;
use crate::tax::TaxService;

/// The product a line item was created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: EntityId,

    /// Human-readable product name.
    pub name: String,

    /// Current unit price.
    pub price: Money,

    /// Tax classes the product is taxed under.
    #[serde(default)]
    pub tax_classes: BTreeSet<String>,
}

impl Product {
    /// Creates a product without tax classes.
    pub fn new(id: u64, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.into(),
            price,
            tax_classes: BTreeSet::new(),
        }
    }

    /// Adds a tax class.
    pub fn with_tax_class(mut self, class: impl Into<String>) -> Self {
        self.tax_classes.insert(class.into());
        self
    }

    /// Returns the tax classes the product is taxed under.
    pub fn tax_classes(&self) -> &BTreeSet<String> {
        &self.tax_classes
    }
}

/// One priced entry of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Key unique within the owning order.
    pub key: ItemKey,

    /// The underlying product.
    pub product: Product,

    /// Variation attributes the key was derived from.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variation: BTreeMap<String, String>,

    /// Quantity ordered.
    pub quantity: u32,

    /// Unit price at the time the item was added.
    pub price: Money,

    /// Per-unit tax by tax class.
    #[serde(default)]
    pub tax: BTreeMap<String, Money>,
}

impl LineItem {
    /// Creates an untaxed line item priced at the product's current price.
    pub fn new(product: Product, quantity: u32) -> Self {
        Self {
            key: ItemKey::for_product(product.id, &BTreeMap::new()),
            price: product.price,
            product,
            variation: BTreeMap::new(),
            quantity,
            tax: BTreeMap::new(),
        }
    }

    /// Creates a line item with per-unit tax taken from the tax service
    /// for every class of the product.
    pub fn priced(product: Product, quantity: u32, taxes: &dyn TaxService) -> Self {
        let tax = product
            .tax_classes()
            .iter()
            .map(|class| (class.clone(), taxes.get(&product, class)))
            .collect();
        Self {
            tax,
            ..Self::new(product, quantity)
        }
    }

    /// Sets variation attributes and re-derives the key from them.
    pub fn with_variation(mut self, variation: BTreeMap<String, String>) -> Self {
        self.key = ItemKey::for_product(self.product.id, &variation);
        self.variation = variation;
        self
    }

    /// Overrides the key.
    pub fn with_key(mut self, key: ItemKey) -> Self {
        self.key = key;
        self
    }

    /// Overrides the unit price.
    pub fn with_price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    /// Sets the per-unit tax of a class.
    pub fn with_tax(mut self, class: impl Into<String>, per_unit: Money) -> Self {
        self.tax.insert(class.into(), per_unit);
        self
    }

    /// Returns quantity × unit price.
    pub fn cost(&self) -> Money {
        self.price.multiply(self.quantity)
    }

    /// Returns the per-unit tax summed over classes.
    pub fn unit_tax(&self) -> Money {
        self.tax.values().sum()
    }

    /// Returns the tax of the whole line summed over classes.
    pub fn total_tax(&self) -> Money {
        self.unit_tax().multiply(self.quantity)
    }
}
