//! Tax service seam and a rate-table implementation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::customer::{Customer, TaxLocation};
use crate::order::{Money, Product};
use crate::shipping::ShippingMethod;

/// Source of tax amounts for products and shipping.
pub trait TaxService: Send + Sync {
    /// Returns the per-unit tax of a product in one tax class.
    fn get(&self, product: &Product, tax_class: &str) -> Money;

    /// Returns the tax on a shipping price in one tax class, for the
    /// customer's jurisdiction.
    fn get_shipping(
        &self,
        method: &dyn ShippingMethod,
        price: Money,
        tax_class: &str,
        customer: &Customer,
    ) -> Money;

    /// Returns the tax on a shipping price across every class the method
    /// declares.
    fn calculate_shipping(
        &self,
        method: &dyn ShippingMethod,
        price: Money,
        customer: &Customer,
    ) -> Money {
        method
            .tax_classes()
            .iter()
            .map(|class| self.get_shipping(method, price, class, customer))
            .sum()
    }
}

/// Tax service backed by a table of rates per class, with optional
/// per-country overrides.
#[derive(Debug, Clone, Default)]
pub struct TaxRates {
    rates: BTreeMap<String, Decimal>,
    regional: BTreeMap<String, BTreeMap<String, Decimal>>,
}

impl TaxRates {
    /// Creates an empty table; every class is untaxed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base rate of a class (0.23 = 23%).
    pub fn with_rate(mut self, class: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(class.into(), rate);
        self
    }

    /// Sets the rate of a class for customers located in a country.
    pub fn with_regional_rate(
        mut self,
        country: impl Into<String>,
        class: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        self.regional
            .entry(country.into())
            .or_default()
            .insert(class.into(), rate);
        self
    }

    /// Returns the rate applicable to a class at a location.
    pub fn rate(&self, class: &str, location: Option<&TaxLocation>) -> Decimal {
        location
            .and_then(|location| self.regional.get(&location.country))
            .and_then(|rates| rates.get(class))
            .or_else(|| self.rates.get(class))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl TaxService for TaxRates {
    fn get(&self, product: &Product, tax_class: &str) -> Money {
        if !product.tax_classes().contains(tax_class) {
            return Money::zero();
        }
        product.price.scale(self.rate(tax_class, None))
    }

    fn get_shipping(
        &self,
        _method: &dyn ShippingMethod,
        price: Money,
        tax_class: &str,
        customer: &Customer,
    ) -> Money {
        price.scale(self.rate(tax_class, customer.location()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::FlatRate;

    fn rates() -> TaxRates {
        TaxRates::new()
            .with_rate("standard", Decimal::new(20, 2))
            .with_rate("reduced", Decimal::new(5, 2))
            .with_regional_rate("DE", "standard", Decimal::new(19, 2))
    }

    #[test]
    fn test_product_tax_only_for_declared_classes() {
        let product =
            Product::new(1, "Book", Money::from_cents(1000)).with_tax_class("reduced");
        let rates = rates();

        assert_eq!(rates.get(&product, "reduced"), Money::from_cents(50));
        assert_eq!(rates.get(&product, "standard"), Money::zero());
    }

    #[test]
    fn test_shipping_tax_uses_customer_location() {
        let method = FlatRate::per_order(Money::from_cents(1000)).with_tax_class("standard");
        let rates = rates();
        let price = Money::from_cents(1000);

        let guest = Customer::guest();
        let german = Customer::guest().with_location(TaxLocation::country("DE"));
        let french = Customer::guest().with_location(TaxLocation::country("FR"));

        assert_eq!(
            rates.get_shipping(&method, price, "standard", &guest),
            Money::from_cents(200)
        );
        assert_eq!(
            rates.get_shipping(&method, price, "standard", &german),
            Money::from_cents(190)
        );
        assert_eq!(
            rates.get_shipping(&method, price, "standard", &french),
            Money::from_cents(200)
        );
    }

    #[test]
    fn test_calculate_shipping_sums_declared_classes() {
        let method = FlatRate::per_order(Money::from_cents(1000))
            .with_tax_class("standard")
            .with_tax_class("reduced");
        let total = rates().calculate_shipping(&method, Money::from_cents(1000), &Customer::guest());
        assert_eq!(total, Money::from_cents(250));
    }

    #[test]
    fn test_unknown_class_is_untaxed() {
        assert_eq!(rates().rate("luxury", None), Decimal::ZERO);
    }
}
