//! Order lifecycle use cases: staff-driven status transitions, customer
//! self-cancellation and payment tracking.
//!
//! A status write and any stock restoration it implies happen inside the
//! same transaction; the order row is locked first so concurrent calls
//! cannot double-restore.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::domain::order::Order;
use crate::domain::status::{OrderStatus, PaymentStatus};
use crate::error::{ApiError, ApiResult};
use crate::store::inventory::{self, RestoreError};
use crate::store::orders::{self, OrderWithLines};

/// Staff-driven transition along the allowed-transition table.
///
/// Admins may act on any order; sellers only on orders containing at least
/// one of their medicines. Moving to CANCELLED restores every line's stock.
/// Moving to RETURNED does not restock: that matches the current business
/// rule, where returned goods re-enter inventory through a manual adjustment.
pub async fn update_status(
    pool: &PgPool,
    order_id: Uuid,
    auth: AuthUser,
    target: OrderStatus,
    tracking_number: Option<String>,
) -> ApiResult<OrderWithLines> {
    let mut tx = pool.begin().await?;

    let (mut order, lines) = orders::fetch_for_update(&mut tx, order_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    if auth.role == Role::Seller && !orders::seller_has_lines(&mut tx, order_id, auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "You can only update orders containing your medicines",
        ));
    }

    order.transition(target, tracking_number)?;

    if order.status == OrderStatus::Cancelled {
        restore_lines(&mut tx, &lines).await?;
    }
    orders::update_status(&mut tx, &order).await?;
    tx.commit().await?;

    tracing::info!(
        order_number = %order.order_number,
        status = %order.status,
        actor = %auth.user_id,
        "order status updated"
    );
    Ok(OrderWithLines { order, lines })
}

/// Customer self-cancellation, ownership-scoped and limited to
/// PENDING/CONFIRMED. Restores exactly what checkout reserved.
pub async fn cancel(pool: &PgPool, order_id: Uuid, user_id: Uuid) -> ApiResult<OrderWithLines> {
    let mut tx = pool.begin().await?;

    let (mut order, lines) = orders::fetch_owned_for_update(&mut tx, order_id, user_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    order.cancel_by_customer()?;

    restore_lines(&mut tx, &lines).await?;
    orders::update_status(&mut tx, &order).await?;
    tx.commit().await?;

    tracing::info!(
        order_number = %order.order_number,
        user_id = %user_id,
        "order cancelled by customer"
    );
    Ok(OrderWithLines { order, lines })
}

/// Externally driven payment status update (admin only at the router).
pub async fn update_payment(
    pool: &PgPool,
    order_id: Uuid,
    payment_status: PaymentStatus,
) -> ApiResult<Order> {
    let mut tx = pool.begin().await?;

    let (mut order, _lines) = orders::fetch_for_update(&mut tx, order_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    order.set_payment_status(payment_status);
    orders::update_payment(&mut tx, &order).await?;
    tx.commit().await?;

    Ok(order)
}

async fn restore_lines(
    conn: &mut sqlx::PgConnection,
    lines: &[crate::domain::order::OrderLine],
) -> ApiResult<()> {
    for line in lines {
        inventory::restore(conn, line.medicine_id, line.quantity)
            .await
            .map_err(|e| match e {
                RestoreError::NotFound => ApiError::NotFound("Medicine"),
                RestoreError::Database(e) => ApiError::Database(e),
            })?;
    }
    Ok(())
}
