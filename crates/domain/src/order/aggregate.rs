//! Order aggregate implementation.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{EntityId, ItemKey};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::{
    LineItem, Money, OrderError, OrderSnapshot, OrderStatus, ShippingSnapshot, StatusChange,
    TaxLedger,
};
use crate::config::OrderConfig;
use crate::customer::Customer;
use crate::policy::ErrorPolicy;
use crate::shipping::ShippingMethod;
use crate::tax::TaxService;

/// Outcome of a quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityChange {
    /// The item stays in the order with a new quantity.
    Updated { previous: u32, current: u32 },
    /// A non-positive quantity removed the item.
    Removed(LineItem),
}

/// Order aggregate root.
///
/// Keeps its financial figures up to date incrementally: every mutation
/// applies exactly the delta it causes, so at any point
/// `total == subtotal + tax + shipping tax - discount` and
/// `subtotal == product subtotal + shipping price`.
#[derive(Debug, Clone)]
pub struct Order {
    id: EntityId,
    number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    customer: Customer,

    /// Line items in insertion order; keys are unique.
    items: Vec<LineItem>,

    shipping_method: Option<Arc<dyn ShippingMethod>>,
    shipping_price: Money,
    payment_method: Option<String>,

    product_subtotal: Money,
    subtotal: Money,
    total: Money,
    discount: Money,
    tax: TaxLedger,
    shipping_tax: TaxLedger,

    status: OrderStatus,
    status_history: Vec<StatusChange>,
    customer_note: Option<String>,

    policy: Arc<dyn ErrorPolicy>,
}

impl Order {
    /// Creates an empty order for a guest, with a zero ledger entry for
    /// every known tax class.
    pub fn new<I, S>(tax_classes: I, policy: Arc<dyn ErrorPolicy>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tax = TaxLedger::new(tax_classes);
        let shipping_tax = TaxLedger::new(tax.amounts().keys().cloned());
        let now = Utc::now();

        Self {
            id: EntityId::UNASSIGNED,
            number: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            customer: Customer::guest(),
            items: Vec::new(),
            shipping_method: None,
            shipping_price: Money::zero(),
            payment_method: None,
            product_subtotal: Money::zero(),
            subtotal: Money::zero(),
            total: Money::zero(),
            discount: Money::zero(),
            tax,
            shipping_tax,
            status: OrderStatus::default(),
            status_history: Vec::new(),
            customer_note: None,
            policy,
        }
    }

    /// Creates an empty order from configuration.
    pub fn from_config(config: &OrderConfig) -> Self {
        Self::new(config.tax_classes.iter().cloned(), config.policy())
    }
}

// Query methods
impl Order {
    /// Returns the order id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the order number, once assigned.
    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }

    /// Returns the display title of the order.
    pub fn title(&self) -> String {
        format!("Order {}", self.number.as_deref().unwrap_or_default())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    /// Returns all items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Returns the number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns true if the order has items.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Returns an item by key.
    ///
    /// A missing key is a violation handled by the error policy.
    pub fn get_item(&self, key: &ItemKey) -> Result<Option<&LineItem>, OrderError> {
        match self.items.iter().find(|item| item.key == *key) {
            Some(item) => Ok(Some(item)),
            None => self.tolerate(self.item_not_found(key)),
        }
    }

    pub fn shipping_method(&self) -> Option<&Arc<dyn ShippingMethod>> {
        self.shipping_method.as_ref()
    }

    /// Returns true if the selected shipping method has the given id.
    pub fn has_shipping_method(&self, method_id: &str) -> bool {
        self.shipping_method
            .as_ref()
            .is_some_and(|method| method.id() == method_id)
    }

    pub fn shipping_price(&self) -> Money {
        self.shipping_price
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    /// Sum of item costs, before tax and shipping.
    pub fn product_subtotal(&self) -> Money {
        self.product_subtotal
    }

    /// Product subtotal plus shipping price.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Subtotal plus all tax, minus discount.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Tax on items, by class.
    pub fn tax(&self) -> &TaxLedger {
        &self.tax
    }

    /// Tax on shipping, by class.
    pub fn shipping_tax(&self) -> &TaxLedger {
        &self.shipping_tax
    }

    /// Returns the total tax on items, cached until the ledger changes.
    pub fn total_tax(&self) -> Money {
        self.tax.total()
    }

    /// Returns item tax plus shipping tax for every class in either ledger.
    pub fn combined_tax(&self) -> BTreeMap<String, Money> {
        self.tax.combined(&self.shipping_tax)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the status transitions, oldest first.
    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    pub fn customer_note(&self) -> Option<&str> {
        self.customer_note.as_deref()
    }
}

// Item mutations
impl Order {
    /// Adds an item under its key.
    ///
    /// An item already stored under the same key is replaced; its
    /// contribution is withdrawn first, quantities are not merged.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), OrderError> {
        if item.quantity == 0 {
            return self
                .tolerate::<()>(OrderError::InvalidQuantity {
                    value: item.quantity.to_string(),
                })
                .map(|_| ());
        }

        match self.position(&item.key) {
            Some(index) => {
                let previous = std::mem::replace(&mut self.items[index], item);
                self.withdraw(&previous);
                self.accrue(index);
            }
            None => {
                self.items.push(item);
                self.accrue(self.items.len() - 1);
            }
        }
        Ok(())
    }

    /// Removes an item and withdraws its contribution from every figure.
    pub fn remove_item(&mut self, key: &ItemKey) -> Result<Option<LineItem>, OrderError> {
        let Some(index) = self.position(key) else {
            return self.tolerate(self.item_not_found(key));
        };

        let item = self.items.remove(index);
        self.withdraw(&item);
        Ok(Some(item))
    }

    /// Sets the quantity of an item; zero or less removes it.
    ///
    /// Prices move by the stored unit price and per-unit tax, but the tax
    /// ledger moves by the rates the tax service reports now for each of
    /// the product's classes. The item's stored per-unit tax is left as is.
    pub fn update_quantity(
        &mut self,
        key: &ItemKey,
        quantity: i64,
        taxes: &dyn TaxService,
    ) -> Result<Option<QuantityChange>, OrderError> {
        let Some(index) = self.position(key) else {
            return self.tolerate(self.item_not_found(key));
        };

        if quantity <= 0 {
            return Ok(self.remove_item(key)?.map(QuantityChange::Removed));
        }

        let Ok(quantity) = u32::try_from(quantity) else {
            return self.tolerate(OrderError::InvalidQuantity {
                value: quantity.to_string(),
            });
        };

        let item = &self.items[index];
        let previous = item.quantity;
        let difference = Decimal::from(i64::from(quantity) - i64::from(previous));
        let price = item.price;
        let unit_tax = item.unit_tax();
        let class_taxes: Vec<(String, Money)> = item
            .product
            .tax_classes()
            .iter()
            .map(|class| (class.clone(), taxes.get(&item.product, class)))
            .collect();

        self.total += (price + unit_tax).scale(difference);
        self.subtotal += price.scale(difference);
        self.product_subtotal += price.scale(difference);
        for (class, rate) in class_taxes {
            self.tax.add(&class, rate.scale(difference));
        }
        self.items[index].quantity = quantity;

        Ok(Some(QuantityChange::Updated {
            previous,
            current: quantity,
        }))
    }

    /// Sets the quantity of an item from raw text input.
    ///
    /// Accepts whole numbers, including `"3.0"`; anything else is an
    /// invalid argument.
    pub fn update_quantity_input(
        &mut self,
        key: &ItemKey,
        raw: &str,
        taxes: &dyn TaxService,
    ) -> Result<Option<QuantityChange>, OrderError> {
        match parse_quantity(raw) {
            Some(quantity) => self.update_quantity(key, quantity, taxes),
            None => self.tolerate(OrderError::InvalidQuantity {
                value: raw.to_string(),
            }),
        }
    }

    /// Removes every item and the shipping selection, zeroing all figures
    /// except the discount.
    pub fn remove_items(&mut self) {
        self.remove_shipping_method();
        self.items.clear();
        self.product_subtotal = Money::zero();
        self.subtotal = Money::zero();
        self.total = Money::zero();
        self.tax.reset();
    }

    fn position(&self, key: &ItemKey) -> Option<usize> {
        self.items.iter().position(|item| item.key == *key)
    }

    fn accrue(&mut self, index: usize) {
        let item = &self.items[index];
        let cost = item.cost();
        let total_tax = item.total_tax();
        let line_tax: Vec<(String, Money)> = item
            .tax
            .iter()
            .map(|(class, per_unit)| (class.clone(), per_unit.multiply(item.quantity)))
            .collect();

        self.product_subtotal += cost;
        self.subtotal += cost;
        self.total += cost + total_tax;
        for (class, amount) in line_tax {
            self.tax.add(&class, amount);
        }
    }

    fn withdraw(&mut self, item: &LineItem) {
        let cost = item.cost();
        self.product_subtotal -= cost;
        self.subtotal -= cost;
        self.total -= cost + item.total_tax();
        for (class, per_unit) in &item.tax {
            self.tax.subtract(class, per_unit.multiply(item.quantity));
        }
    }
}

// Shipping, payment and discount
impl Order {
    /// Selects a shipping method, replacing any previous selection.
    ///
    /// The method prices itself against the order as it stands without
    /// the previous selection.
    pub fn set_shipping_method(&mut self, method: Arc<dyn ShippingMethod>, taxes: &dyn TaxService) {
        self.remove_shipping_method();

        let price = method.calculate(self);
        let mut shipping_tax = Money::zero();
        for class in method.tax_classes() {
            let amount = taxes.get_shipping(method.as_ref(), price, &class, &self.customer);
            self.shipping_tax.set(&class, amount);
            shipping_tax += amount;
        }

        let reported = taxes.calculate_shipping(method.as_ref(), price, &self.customer);
        if reported != shipping_tax {
            tracing::debug!(
                order_id = %self.id,
                method = method.id(),
                %reported,
                per_class = %shipping_tax,
                "shipping tax differs from per-class sum, using per-class sum"
            );
        }

        self.shipping_price = price;
        self.subtotal += price;
        self.total += price + shipping_tax;
        self.shipping_method = Some(method);
    }

    /// Clears the shipping selection and withdraws its price and tax.
    ///
    /// Shipping tax classes keep their entries, zeroed.
    pub fn remove_shipping_method(&mut self) {
        self.subtotal -= self.shipping_price;
        self.total -= self.shipping_price + self.shipping_tax.total();

        self.shipping_method = None;
        self.shipping_price = Money::zero();
        self.shipping_tax.reset();
    }

    pub fn set_payment_method(&mut self, method: Option<String>) {
        self.payment_method = method;
    }

    /// Replaces the discount, moving the total by the difference.
    pub fn set_discount(&mut self, discount: Money) {
        self.total += self.discount - discount;
        self.discount = discount;
    }
}

// Identity, customer and status
impl Order {
    /// Sets the id allocated by the persistence layer.
    pub fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    /// Assigns the order number. It cannot change once assigned.
    pub fn set_number(&mut self, number: impl Into<String>) -> Result<(), OrderError> {
        let number = number.into();
        match &self.number {
            Some(current) if *current != number => self
                .tolerate::<()>(OrderError::NumberAlreadyAssigned {
                    current: current.clone(),
                })
                .map(|_| ()),
            _ => {
                self.number = Some(number);
                Ok(())
            }
        }
    }

    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at;
    }

    pub fn set_updated_at(&mut self, updated_at: DateTime<Utc>) {
        self.updated_at = updated_at;
    }

    /// Replaces the customer. Shipping tax already applied is not
    /// recomputed until the shipping method is selected again.
    pub fn set_customer(&mut self, customer: Customer) {
        self.customer = customer;
    }

    pub fn set_customer_note(&mut self, note: Option<String>) {
        self.customer_note = note;
    }

    /// Changes the status, recording the transition.
    ///
    /// Setting the current status again records nothing. The first move
    /// to `Completed` stamps the completion time.
    pub fn set_status(&mut self, status: OrderStatus, message: impl Into<String>) {
        if status == self.status {
            return;
        }

        self.status_history.push(StatusChange {
            message: message.into(),
            old_status: self.status,
            new_status: status,
        });
        self.status = status;

        if status == OrderStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }
}

// Persistence
impl Order {
    /// Returns the flat state to persist.
    pub fn state_to_save(&self) -> OrderSnapshot {
        OrderSnapshot {
            id: Some(self.id),
            number: self.number.clone(),
            created_at: Some(self.created_at.timestamp()),
            updated_at: Some(self.updated_at.timestamp()),
            completed_at: Some(self.completed_at.map_or(0, |at| at.timestamp())),
            items: Some(self.items.clone()),
            customer: Some(self.customer.clone()),
            customer_id: Some(self.customer.id()),
            shipping: Some(ShippingSnapshot {
                method: self.shipping_method.as_ref().map(|method| method.state()),
                price: self.shipping_price,
            }),
            payment: self.payment_method.clone(),
            customer_note: self.customer_note.clone(),
            total: Some(self.total),
            product_subtotal: Some(self.product_subtotal),
            subtotal: Some(self.subtotal),
            discount: Some(self.discount),
            shipping_tax: Some(self.shipping_tax.amounts().clone()),
            status: Some(self.status),
            update_messages: Some(self.status_history.clone()),
        }
    }

    /// Rebuilds the order from persisted state.
    ///
    /// Only fields present in the snapshot are applied. Items are re-added
    /// so the tax ledger is rebuilt from them; the total is always
    /// recomputed as subtotal + tax + shipping tax - discount, whatever
    /// total the snapshot carries. The snapshot is checked in full before
    /// anything is applied.
    ///
    /// Returns false if the snapshot was rejected and the error policy
    /// tolerated it; the order is then left as it was.
    pub fn restore_state(&mut self, snapshot: OrderSnapshot) -> Result<bool, OrderError> {
        if let Err(error) = self.check_restorable(&snapshot) {
            return self.tolerate::<()>(error).map(|_| false);
        }

        let created_at = snapshot.created_at.map(timestamp).transpose()?;
        let updated_at = snapshot.updated_at.map(timestamp).transpose()?;
        let completed_at = match snapshot.completed_at {
            Some(0) | None => None,
            Some(secs) => Some(timestamp(secs)?),
        };

        if let Some(id) = snapshot.id {
            self.id = id;
        }
        if let Some(number) = snapshot.number {
            self.number = Some(number);
        }
        if let Some(created_at) = created_at {
            self.created_at = created_at;
        }
        if let Some(updated_at) = updated_at {
            self.updated_at = updated_at;
        }
        if snapshot.completed_at.is_some() {
            self.completed_at = completed_at;
        }
        if let Some(status) = snapshot.status {
            self.status = status;
        }
        if let Some(history) = snapshot.update_messages {
            self.status_history = history;
        }
        for item in snapshot.items.into_iter().flatten() {
            self.items.push(item);
            self.accrue(self.items.len() - 1);
        }
        if let Some(customer) = snapshot.customer {
            self.customer = customer;
        }
        if let Some(shipping) = snapshot.shipping {
            self.shipping_method = shipping.method.map(|state| state.into_method());
            self.shipping_price = shipping.price;
        }
        if let Some(payment) = snapshot.payment {
            self.payment_method = Some(payment);
        }
        if let Some(note) = snapshot.customer_note {
            self.customer_note = Some(note);
        }
        for (class, amount) in snapshot.shipping_tax.into_iter().flatten() {
            self.shipping_tax.add(&class, amount);
        }
        if let Some(product_subtotal) = snapshot.product_subtotal {
            self.product_subtotal = product_subtotal;
        }
        if let Some(subtotal) = snapshot.subtotal {
            self.subtotal = subtotal;
        }
        if let Some(discount) = snapshot.discount {
            self.discount = discount;
        }

        self.total =
            self.subtotal + self.tax.total() + self.shipping_tax.total() - self.discount;
        Ok(true)
    }

    fn check_restorable(&self, snapshot: &OrderSnapshot) -> Result<(), OrderError> {
        if self.has_items() {
            return Err(OrderError::AlreadyPopulated {
                items: self.items.len(),
            });
        }

        let invalid = |reason: String| OrderError::InvalidSnapshot { reason };

        if let Some(items) = &snapshot.items {
            let mut keys = HashSet::with_capacity(items.len());
            for item in items {
                if !keys.insert(item.key) {
                    return Err(invalid(format!("duplicate item key {}", item.key)));
                }
                if item.quantity == 0 {
                    return Err(invalid(format!("item {} has zero quantity", item.key)));
                }
            }
        }
        if let Some(shipping) = &snapshot.shipping {
            if shipping.price.is_negative() {
                return Err(invalid(format!("negative shipping price {}", shipping.price)));
            }
            if shipping.method.is_none() && !shipping.price.is_zero() {
                return Err(invalid(format!(
                    "shipping price {} without a shipping method",
                    shipping.price
                )));
            }
        }
        for secs in [snapshot.created_at, snapshot.updated_at, snapshot.completed_at]
            .into_iter()
            .flatten()
        {
            timestamp(secs)?;
        }
        if magnitude(snapshot).is_none() {
            return Err(invalid("amounts exceed the representable range".to_string()));
        }
        Ok(())
    }
}

// Error policy
impl Order {
    fn item_not_found(&self, key: &ItemKey) -> OrderError {
        OrderError::ItemNotFound {
            key: *key,
            order_id: self.id,
        }
    }

    fn tolerate<T>(&self, error: OrderError) -> Result<Option<T>, OrderError> {
        self.policy.on_violation(self.id, error)?;
        Ok(None)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, OrderError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| OrderError::InvalidSnapshot {
        reason: format!("timestamp {secs} out of range"),
    })
}

/// Sums the absolute value of every amount a restore adds up, or `None`
/// if that overflows. Every figure computed during the restore is bounded
/// by this sum.
fn magnitude(snapshot: &OrderSnapshot) -> Option<Money> {
    let mut sum = Money::zero();
    for item in snapshot.items.iter().flatten() {
        sum = sum.checked_add(item.price.abs().checked_multiply(item.quantity)?)?;
        for per_unit in item.tax.values() {
            sum = sum.checked_add(per_unit.abs().checked_multiply(item.quantity)?)?;
        }
    }

    let amounts = snapshot
        .shipping_tax
        .iter()
        .flatten()
        .map(|(_, amount)| *amount)
        .chain(snapshot.shipping.as_ref().map(|shipping| shipping.price))
        .chain(snapshot.product_subtotal)
        .chain(snapshot.subtotal)
        .chain(snapshot.discount);
    for amount in amounts {
        sum = sum.checked_add(amount.abs())?;
    }
    Some(sum)
}

fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(quantity) = raw.parse::<i64>() {
        return Some(quantity);
    }
    let quantity = Decimal::from_str(raw).ok()?;
    if quantity.fract().is_zero() {
        quantity.to_i64()
    } else {
        None
    }
}
