//! Cart storage
//!
//! Cart lines are transient staging data, unique per (user, medicine).
//! Adding an existing pair merges quantities via an upsert rather than a
//! read-then-write.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::cart::{CartLine, CartSnapshot};
use crate::error::{ApiError, ApiResult};

const LINE_COLUMNS: &str = "c.id, c.medicine_id, m.name AS medicine_name, c.quantity,
                            m.price, m.discount_price, m.stock_quantity AS available_stock";

/// Reads the user's cart joined with current catalog price and stock.
/// An empty cart yields an empty snapshot.
pub async fn snapshot(conn: &mut PgConnection, user_id: Uuid) -> Result<CartSnapshot, sqlx::Error> {
    let lines = sqlx::query_as::<_, CartLine>(&format!(
        "SELECT {LINE_COLUMNS}
         FROM cart_lines c
         JOIN medicines m ON m.id = c.medicine_id
         WHERE c.user_id = $1
         ORDER BY c.created_at DESC",
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(CartSnapshot { lines })
}

/// Adds a medicine to the cart, merging quantities when the (user, medicine)
/// pair already exists. Validates the medicine exists and has enough stock
/// for the requested quantity.
pub async fn add_line(
    pool: &PgPool,
    user_id: Uuid,
    medicine_id: Uuid,
    quantity: i32,
) -> ApiResult<CartLine> {
    let stock: Option<(i32,)> =
        sqlx::query_as("SELECT stock_quantity FROM medicines WHERE id = $1")
            .bind(medicine_id)
            .fetch_optional(pool)
            .await?;
    let (stock,) = stock.ok_or(ApiError::NotFound("Medicine"))?;
    if stock < quantity {
        return Err(ApiError::Validation("Insufficient stock".into()));
    }

    let (line_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO cart_lines (id, user_id, medicine_id, quantity, created_at, updated_at)
         VALUES ($1, $2, $3, $4, NOW(), NOW())
         ON CONFLICT (user_id, medicine_id)
         DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity, updated_at = NOW()
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(medicine_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;

    fetch_line(pool, user_id, line_id).await
}

/// Replaces a cart line's quantity, stock-checked against the catalog.
pub async fn update_line(
    pool: &PgPool,
    user_id: Uuid,
    line_id: Uuid,
    quantity: i32,
) -> ApiResult<CartLine> {
    let stock: Option<(i32,)> = sqlx::query_as(
        "SELECT m.stock_quantity
         FROM cart_lines c
         JOIN medicines m ON m.id = c.medicine_id
         WHERE c.id = $1 AND c.user_id = $2",
    )
    .bind(line_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let (stock,) = stock.ok_or(ApiError::NotFound("Cart item"))?;
    if stock < quantity {
        return Err(ApiError::Validation("Insufficient stock".into()));
    }

    sqlx::query("UPDATE cart_lines SET quantity = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2")
        .bind(line_id)
        .bind(user_id)
        .bind(quantity)
        .execute(pool)
        .await?;

    fetch_line(pool, user_id, line_id).await
}

pub async fn remove_line(pool: &PgPool, user_id: Uuid, line_id: Uuid) -> ApiResult<()> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1 AND user_id = $2")
        .bind(line_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Cart item"));
    }
    Ok(())
}

/// Deletes every cart line for the user. Used both by the clear-cart
/// endpoint and by checkout inside its transaction.
pub async fn clear(conn: &mut PgConnection, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn fetch_line(pool: &PgPool, user_id: Uuid, line_id: Uuid) -> ApiResult<CartLine> {
    sqlx::query_as::<_, CartLine>(&format!(
        "SELECT {LINE_COLUMNS}
         FROM cart_lines c
         JOIN medicines m ON m.id = c.medicine_id
         WHERE c.id = $1 AND c.user_id = $2",
    ))
    .bind(line_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound("Cart item"))
}

/// Wire shape for the cart summary endpoint.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub total_items: usize,
    pub total_quantity: i32,
}

impl From<CartSnapshot> for CartSummary {
    fn from(snapshot: CartSnapshot) -> Self {
        CartSummary {
            subtotal: snapshot.subtotal(),
            total_items: snapshot.lines.len(),
            total_quantity: snapshot.total_quantity(),
            items: snapshot.lines,
        }
    }
}
