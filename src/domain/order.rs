//! Order aggregate
//!
//! An order is built once from a cart snapshot with all prices frozen, then
//! only its status-level fields ever change. Lines are never added or
//! removed after construction.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::cart::CartSnapshot;
use crate::domain::pricing;
use crate::domain::status::{OrderStatus, PaymentStatus};

/// Default shipping country when the customer supplies none.
pub const DEFAULT_COUNTRY: &str = "Bangladesh";

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Insufficient stock for {name}")]
    InsufficientStock { name: String },
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Cannot cancel order at this stage")]
    NotCancellable,
}

/// Shipping details captured at checkout. Copied onto the order verbatim,
/// never re-derived from a live address book.
#[derive(Debug, Clone)]
pub struct ShippingInfo {
    pub shipping_address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of one purchased item. `price` is the unit price the
/// customer was charged; later catalog price changes never touch it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub discount: Decimal,
    pub subtotal: Decimal,
}

impl Order {
    /// Builds an order from a cart snapshot.
    ///
    /// Every line is validated against available stock before anything is
    /// constructed; a partial order is never produced. Prices, per-line
    /// discounts and subtotals are frozen here.
    pub fn from_cart(
        user_id: Uuid,
        cart: &CartSnapshot,
        shipping: ShippingInfo,
    ) -> Result<(Order, Vec<OrderLine>), OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        for line in &cart.lines {
            if line.quantity > line.available_stock {
                return Err(OrderError::InsufficientStock {
                    name: line.medicine_name.clone(),
                });
            }
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let totals = pricing::totals(cart.subtotal());

        let lines = cart
            .lines
            .iter()
            .map(|l| {
                let unit = l.unit_price();
                OrderLine {
                    id: Uuid::new_v4(),
                    order_id: id,
                    medicine_id: l.medicine_id,
                    medicine_name: l.medicine_name.clone(),
                    quantity: l.quantity,
                    price: unit,
                    discount: l.price - unit,
                    subtotal: pricing::line_subtotal(unit, l.quantity),
                }
            })
            .collect();

        let order = Order {
            id,
            order_number: generate_order_number(),
            user_id,
            status: OrderStatus::Pending,
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            tax: totals.tax,
            discount: totals.discount,
            total_amount: totals.total_amount,
            shipping_address: shipping.shipping_address,
            city: shipping.city,
            state: shipping.state,
            zip_code: shipping.zip_code,
            country: shipping.country,
            phone: shipping.phone,
            payment_method: shipping.payment_method,
            payment_status: PaymentStatus::Unpaid,
            notes: shipping.notes,
            tracking_number: None,
            paid_at: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        Ok((order, lines))
    }

    /// Applies a staff-driven status transition, validating it against the
    /// allowed-transition table and recording the per-state timestamps.
    ///
    /// A tracking number may come along on any transition call. The caller is
    /// responsible for restoring stock when the target is `Cancelled`.
    pub fn transition(
        &mut self,
        target: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        if let Some(tracking) = tracking_number {
            self.tracking_number = Some(tracking);
        }
        match target {
            OrderStatus::Delivered => self.delivered_at = Some(Utc::now()),
            OrderStatus::Cancelled => self.cancelled_at = Some(Utc::now()),
            _ => {}
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Customer self-cancellation: only allowed before fulfilment starts.
    pub fn cancel_by_customer(&mut self) -> Result<(), OrderError> {
        if !self.status.customer_cancellable() {
            return Err(OrderError::NotCancellable);
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Records an externally driven payment status. Marking the order paid
    /// stamps `paid_at`.
    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
        if status == PaymentStatus::Paid {
            self.paid_at = Some(Utc::now());
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Human-readable order number: `ORD-<unix millis>-<6 uppercase base36>`.
/// Unique per the store's constraint; collisions are negligible.
fn generate_order_number() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}
