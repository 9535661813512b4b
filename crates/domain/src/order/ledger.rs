//! Per-tax-class ledger with a lazily cached total.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use super::Money;

/// Mapping from tax class to accumulated tax amount.
///
/// Every mutation goes through a `&mut self` method on this type, and each
/// of those drops the cached total, so the total can never be observed
/// out of date.
#[derive(Debug, Clone, Default)]
pub struct TaxLedger {
    amounts: BTreeMap<String, Money>,
    total: OnceCell<Money>,
}

impl TaxLedger {
    /// Creates a ledger with a zero entry for every given class.
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            amounts: classes
                .into_iter()
                .map(|class| (class.into(), Money::zero()))
                .collect(),
            total: OnceCell::new(),
        }
    }

    /// Returns the amount recorded for a class (zero when unknown).
    pub fn get(&self, class: &str) -> Money {
        self.amounts.get(class).copied().unwrap_or_default()
    }

    /// Returns all entries.
    pub fn amounts(&self) -> &BTreeMap<String, Money> {
        &self.amounts
    }

    /// Returns true if the class has an entry.
    pub fn contains(&self, class: &str) -> bool {
        self.amounts.contains_key(class)
    }

    /// Returns the sum of all entries, computing it on first use.
    pub fn total(&self) -> Money {
        *self.total.get_or_init(|| self.amounts.values().sum())
    }

    /// Adds to a class, creating the entry when missing.
    pub fn add(&mut self, class: &str, amount: Money) {
        self.total.take();
        *self.amounts.entry(class.to_string()).or_default() += amount;
    }

    /// Subtracts from a class, creating the entry when missing.
    pub fn subtract(&mut self, class: &str, amount: Money) {
        self.add(class, -amount);
    }

    /// Overwrites the amount of a class.
    pub fn set(&mut self, class: &str, amount: Money) {
        self.total.take();
        self.amounts.insert(class.to_string(), amount);
    }

    /// Zeroes every entry, keeping the set of classes.
    pub fn reset(&mut self) {
        self.total.take();
        for amount in self.amounts.values_mut() {
            *amount = Money::zero();
        }
    }

    /// Returns the per-class sum of this ledger and another one.
    pub fn combined(&self, other: &TaxLedger) -> BTreeMap<String, Money> {
        let mut combined = self.amounts.clone();
        for (class, amount) in &other.amounts {
            *combined.entry(class.clone()).or_default() += *amount;
        }
        combined
    }

    #[cfg(test)]
    fn is_total_cached(&self) -> bool {
        self.total.get().is_some()
    }
}

impl PartialEq for TaxLedger {
    fn eq(&self, other: &Self) -> bool {
        self.amounts == other.amounts
    }
}
