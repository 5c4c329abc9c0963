//! Inventory ledger
//!
//! Sole owner of `medicines.stock_quantity`. Reservation is a single
//! conditional decrement at the storage layer, never a read-then-write, so
//! two concurrent checkouts can never both take the last unit.

use sqlx::PgConnection;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("insufficient stock")]
    Insufficient,
    #[error("medicine not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Restoration has no stock precondition, so it cannot run short; its only
/// failure modes are a missing row or the database itself.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("medicine not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Atomically checks `stock_quantity >= quantity` and decrements it in the
/// same statement. Zero rows affected means either the row is gone or the
/// stock ran short; a follow-up read tells the two apart.
pub async fn reserve(
    conn: &mut PgConnection,
    medicine_id: Uuid,
    quantity: i32,
) -> Result<(), StockError> {
    let result = sqlx::query(
        "UPDATE medicines
         SET stock_quantity = stock_quantity - $2, updated_at = NOW()
         WHERE id = $1 AND stock_quantity >= $2",
    )
    .bind(medicine_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }
    let exists: Option<(i32,)> =
        sqlx::query_as("SELECT stock_quantity FROM medicines WHERE id = $1")
            .bind(medicine_id)
            .fetch_optional(&mut *conn)
            .await?;
    match exists {
        Some(_) => Err(StockError::Insufficient),
        None => Err(StockError::NotFound),
    }
}

/// Unconditionally increments stock. Returned stock always re-enters the
/// pool; there is no upper bound to check.
pub async fn restore(
    conn: &mut PgConnection,
    medicine_id: Uuid,
    quantity: i32,
) -> Result<(), RestoreError> {
    let result = sqlx::query(
        "UPDATE medicines
         SET stock_quantity = stock_quantity + $2, updated_at = NOW()
         WHERE id = $1",
    )
    .bind(medicine_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RestoreError::NotFound);
    }
    Ok(())
}
