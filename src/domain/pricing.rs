//! Pricing rules
//!
//! All monetary math uses `Decimal` with two digits of precision. Totals are
//! charged to customers, so floating point is never acceptable here.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Orders strictly above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(500);

/// Flat shipping fee below the free-shipping threshold.
pub const FLAT_SHIPPING_COST: Decimal = dec!(50);

/// Flat tax rate applied to the subtotal.
pub const TAX_RATE: Decimal = dec!(0.05);

/// Effective selling price of a medicine: the discount price wins when it is
/// set and positive, otherwise the list price applies.
///
/// Every price read in the system (cart summary, checkout, order-line
/// freezing) goes through this one function so the previewed and charged
/// amounts can never disagree.
pub fn unit_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(d) if d > Decimal::ZERO => d,
        _ => price,
    }
}

/// Subtotal of one line at a given unit price.
pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Order-level monetary breakdown derived from a cart subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

/// Derives shipping, tax and total from a subtotal.
///
/// The order-level `discount` is a placeholder that defaults to zero at
/// creation; line-level discounts are already folded into the subtotal.
pub fn totals(subtotal: Decimal) -> Totals {
    let subtotal = subtotal.round_dp(2);
    let shipping_cost = if subtotal > FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_COST
    };
    let tax = (subtotal * TAX_RATE).round_dp(2);
    let discount = Decimal::ZERO;
    let total_amount = (subtotal + shipping_cost + tax - discount).round_dp(2);
    Totals {
        subtotal,
        shipping_cost,
        tax,
        discount,
        total_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_price_resolution() {
        assert_eq!(unit_price(dec!(100), None), dec!(100));
        assert_eq!(unit_price(dec!(100), Some(dec!(80))), dec!(80));
        // A zero discount price means "no discount", not "free".
        assert_eq!(unit_price(dec!(100), Some(Decimal::ZERO)), dec!(100));
    }

    #[test]
    fn test_small_order_pays_shipping() {
        // 2 x 100.00, no discount
        let t = totals(line_subtotal(dec!(100), 2));
        assert_eq!(t.subtotal, dec!(200));
        assert_eq!(t.shipping_cost, dec!(50));
        assert_eq!(t.tax, dec!(10.00));
        assert_eq!(t.total_amount, dec!(260.00));
    }

    #[test]
    fn test_large_order_ships_free() {
        let t = totals(dec!(600));
        assert_eq!(t.shipping_cost, Decimal::ZERO);
        assert_eq!(t.tax, dec!(30.00));
        assert_eq!(t.total_amount, dec!(630.00));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Exactly 500 still pays shipping.
        assert_eq!(totals(dec!(500)).shipping_cost, FLAT_SHIPPING_COST);
        assert_eq!(totals(dec!(500.01)).shipping_cost, Decimal::ZERO);
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let t = totals(dec!(99.99));
        // 99.99 * 0.05 = 4.9995
        assert_eq!(t.tax, dec!(5.00));
        assert_eq!(t.total_amount, dec!(154.99));
    }

    #[test]
    fn test_totals_are_deterministic() {
        assert_eq!(totals(dec!(123.45)), totals(dec!(123.45)));
    }
}
