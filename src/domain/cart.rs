//! Cart snapshot
//!
//! A snapshot is a user's cart lines joined with the *current* catalog price
//! and stock. It is transient staging data: checkout consumes it, nothing
//! else owns it.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::pricing;

/// One cart line with the live catalog row joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub available_stock: i32,
}

impl CartLine {
    pub fn unit_price(&self) -> Decimal {
        pricing::unit_price(self.price, self.discount_price)
    }

    pub fn line_subtotal(&self) -> Decimal {
        pricing::line_subtotal(self.unit_price(), self.quantity)
    }
}

/// A user's full cart at one point in time. An empty cart yields an empty
/// snapshot, not an error; rejecting empty checkouts is the orchestrator's
/// job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc + l.line_subtotal())
    }

    pub fn total_quantity(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
pub(crate) fn test_line(
    name: &str,
    quantity: i32,
    price: Decimal,
    discount_price: Option<Decimal>,
    available_stock: i32,
) -> CartLine {
    CartLine {
        id: Uuid::new_v4(),
        medicine_id: Uuid::new_v4(),
        medicine_name: name.to_string(),
        quantity,
        price,
        discount_price,
        available_stock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_prefers_discount_price() {
        let line = test_line("Paracetamol", 3, dec!(12.50), Some(dec!(10.00)), 20);
        assert_eq!(line.unit_price(), dec!(10.00));
        assert_eq!(line.line_subtotal(), dec!(30.00));
    }

    #[test]
    fn test_snapshot_subtotal() {
        let snapshot = CartSnapshot {
            lines: vec![
                test_line("A", 2, dec!(100), None, 10),
                test_line("B", 1, dec!(50), Some(dec!(40)), 5),
            ],
        };
        assert_eq!(snapshot.subtotal(), dec!(240));
        assert_eq!(snapshot.total_quantity(), 3);
        // Reading twice without mutation yields identical totals.
        assert_eq!(snapshot.subtotal(), snapshot.subtotal());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot { lines: vec![] };
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.subtotal(), Decimal::ZERO);
    }
}
