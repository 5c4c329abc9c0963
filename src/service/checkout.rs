//! Checkout orchestrator
//!
//! One transaction end to end: read the cart snapshot, build the order
//! aggregate (failing fast before any mutation), persist order and lines,
//! reserve stock per line, clear the cart. A reservation that fails because
//! a concurrent checkout drained the stock rolls the whole thing back —
//! no order row, no partial decrement, cart untouched.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::order::{Order, OrderError, ShippingInfo};
use crate::error::{ApiError, ApiResult};
use crate::store::inventory::{self, StockError};
use crate::store::orders::OrderWithLines;
use crate::store::{cart, orders};

pub async fn checkout(
    pool: &PgPool,
    user_id: Uuid,
    shipping: ShippingInfo,
) -> ApiResult<OrderWithLines> {
    let mut tx = pool.begin().await?;

    let snapshot = cart::snapshot(&mut tx, user_id).await?;
    let (order, lines) = Order::from_cart(user_id, &snapshot, shipping)?;

    orders::insert(&mut tx, &order, &lines).await?;

    for line in &lines {
        match inventory::reserve(&mut tx, line.medicine_id, line.quantity).await {
            Ok(()) => {}
            // Lost the race against a concurrent checkout; dropping the
            // transaction rolls back the order insert and every prior
            // reservation.
            Err(StockError::Insufficient) => {
                return Err(OrderError::InsufficientStock {
                    name: line.medicine_name.clone(),
                }
                .into());
            }
            Err(StockError::NotFound) => return Err(ApiError::NotFound("Medicine")),
            Err(StockError::Database(e)) => return Err(e.into()),
        }
    }

    cart::clear(&mut tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(
        order_number = %order.order_number,
        user_id = %user_id,
        total = %order.total_amount,
        "order placed"
    );
    Ok(OrderWithLines { order, lines })
}
