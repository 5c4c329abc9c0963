//! Order persistence: inserts, role-scoped reads and paginated listings.
//!
//! Orders and their lines are written together inside the caller's
//! transaction; lines are immutable after insert, only status-level columns
//! are ever updated.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::domain::order::{Order, OrderLine};
use crate::domain::status::OrderStatus;

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, subtotal, shipping_cost, tax,
    discount, total_amount, shipping_address, city, state, zip_code, country, phone,
    payment_method, payment_status, notes, tracking_number, paid_at, delivered_at,
    cancelled_at, created_at, updated_at";

const LINE_COLUMNS: &str = "ol.id, ol.order_id, ol.medicine_id, m.name AS medicine_name,
    ol.quantity, ol.price, ol.discount, ol.subtotal";

/// An order plus its lines, the shape every order endpoint returns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: i64) -> Self {
        let total_pages = ((total + i64::from(limit) - 1) / i64::from(limit)) as u32;
        Pagination {
            page,
            limit,
            total,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

/// LIMIT/OFFSET skip for a 1-based page. Widened before the arithmetic so an
/// arbitrarily large client-supplied page cannot overflow.
fn page_offset(page: u32, limit: u32) -> i64 {
    (i64::from(page) - 1) * i64::from(limit)
}

/// Persists a freshly built order and all of its lines.
pub async fn insert(
    conn: &mut PgConnection,
    order: &Order,
    lines: &[OrderLine],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, status, subtotal, shipping_cost, tax,
            discount, total_amount, shipping_address, city, state, zip_code, country, phone,
            payment_method, payment_status, notes, tracking_number, paid_at, delivered_at,
            cancelled_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19, $20, $21, $22, $23, $24)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.tax)
    .bind(order.discount)
    .bind(order.total_amount)
    .bind(&order.shipping_address)
    .bind(&order.city)
    .bind(&order.state)
    .bind(&order.zip_code)
    .bind(&order.country)
    .bind(&order.phone)
    .bind(&order.payment_method)
    .bind(order.payment_status)
    .bind(&order.notes)
    .bind(&order.tracking_number)
    .bind(order.paid_at)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for line in lines {
        sqlx::query(
            "INSERT INTO order_lines (id, order_id, medicine_id, quantity, price, discount, subtotal)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(line.id)
        .bind(line.order_id)
        .bind(line.medicine_id)
        .bind(line.quantity)
        .bind(line.price)
        .bind(line.discount)
        .bind(line.subtotal)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Loads an order and its lines with a row lock, so concurrent transitions
/// against the same order serialize instead of double-applying side effects.
pub async fn fetch_for_update(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Option<(Order, Vec<OrderLine>)>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE",
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    match order {
        Some(order) => {
            let lines = fetch_lines(conn, order_id).await?;
            Ok(Some((order, lines)))
        }
        None => Ok(None),
    }
}

/// Ownership-scoped variant of [`fetch_for_update`] for customer
/// self-cancellation: an order that exists but belongs to someone else is
/// indistinguishable from one that does not exist.
pub async fn fetch_owned_for_update(
    conn: &mut PgConnection,
    order_id: Uuid,
    user_id: Uuid,
) -> Result<Option<(Order, Vec<OrderLine>)>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    match order {
        Some(order) => {
            let lines = fetch_lines(conn, order_id).await?;
            Ok(Some((order, lines)))
        }
        None => Ok(None),
    }
}

/// Whether the order contains at least one line whose medicine the seller
/// owns. Sellers may only act on such orders.
pub async fn seller_has_lines(
    conn: &mut PgConnection,
    order_id: Uuid,
    seller_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(
            SELECT 1 FROM order_lines ol
            JOIN medicines m ON m.id = ol.medicine_id
            WHERE ol.order_id = $1 AND m.seller_id = $2
         )",
    )
    .bind(order_id)
    .bind(seller_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Role-scoped order detail: owners see their own orders, sellers the orders
/// containing their medicines, admins everything. A miss is `None` in every
/// case.
pub async fn fetch_visible(
    pool: &PgPool,
    order_id: Uuid,
    auth: AuthUser,
) -> Result<Option<OrderWithLines>, sqlx::Error> {
    let scope = match auth.role {
        Role::Admin => "",
        Role::Customer => "AND user_id = $2",
        Role::Seller => {
            "AND EXISTS(
                SELECT 1 FROM order_lines ol
                JOIN medicines m ON m.id = ol.medicine_id
                WHERE ol.order_id = orders.id AND m.seller_id = $2
             )"
        }
    };
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 {scope}");
    let mut query = sqlx::query_as::<_, Order>(&sql).bind(order_id);
    if auth.role != Role::Admin {
        query = query.bind(auth.user_id);
    }
    let order = query.fetch_optional(pool).await?;
    match order {
        Some(order) => {
            let lines = fetch_lines_pool(pool, order.id).await?;
            Ok(Some(OrderWithLines { order, lines }))
        }
        None => Ok(None),
    }
}

/// A customer's own orders, newest first.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
    page: u32,
    limit: u32,
) -> Result<Paginated<OrderWithLines>, sqlx::Error> {
    let offset = page_offset(page, limit);
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    ))
    .bind(user_id)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    let data = attach_lines(pool, orders).await?;
    Ok(Paginated {
        data,
        pagination: Pagination::new(page, limit, total),
    })
}

/// Every order in the system (admin view), optionally filtered by status.
pub async fn list_all(
    pool: &PgPool,
    page: u32,
    limit: u32,
    status: Option<OrderStatus>,
) -> Result<Paginated<OrderWithLines>, sqlx::Error> {
    let offset = page_offset(page, limit);
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    ))
    .bind(status)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;
    let data = attach_lines(pool, orders).await?;
    Ok(Paginated {
        data,
        pagination: Pagination::new(page, limit, total),
    })
}

/// Orders containing at least one of the seller's medicines, optionally
/// filtered by status. Orders have no direct seller column; the scope runs
/// through order lines.
pub async fn list_for_seller(
    pool: &PgPool,
    seller_id: Uuid,
    page: u32,
    limit: u32,
    status: Option<OrderStatus>,
) -> Result<Paginated<OrderWithLines>, sqlx::Error> {
    const SCOPE: &str = "EXISTS(
        SELECT 1 FROM order_lines ol
        JOIN medicines m ON m.id = ol.medicine_id
        WHERE ol.order_id = orders.id AND m.seller_id = $1
    )";
    let offset = page_offset(page, limit);
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE {SCOPE} AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    ))
    .bind(seller_id)
    .bind(status)
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM orders WHERE {SCOPE} AND ($2::text IS NULL OR status = $2)",
    ))
    .bind(seller_id)
    .bind(status)
    .fetch_one(pool)
    .await?;
    let data = attach_lines(pool, orders).await?;
    Ok(Paginated {
        data,
        pagination: Pagination::new(page, limit, total),
    })
}

/// Persists the mutable status-level columns after a domain transition.
pub async fn update_status(conn: &mut PgConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders
         SET status = $2, tracking_number = $3, delivered_at = $4, cancelled_at = $5,
             updated_at = $6
         WHERE id = $1",
    )
    .bind(order.id)
    .bind(order.status)
    .bind(&order.tracking_number)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Persists a payment status change and its `paid_at` side effect.
pub async fn update_payment(conn: &mut PgConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET payment_status = $2, paid_at = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(order.id)
    .bind(order.payment_status)
    .bind(order.paid_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_lines(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_lines ol
         JOIN medicines m ON m.id = ol.medicine_id
         WHERE ol.order_id = $1",
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await
}

async fn fetch_lines_pool(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_lines ol
         JOIN medicines m ON m.id = ol.medicine_id
         WHERE ol.order_id = $1",
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await
}

/// Fetches the lines for a whole page of orders in one query and zips them
/// back onto their orders.
async fn attach_lines(
    pool: &PgPool,
    orders: Vec<Order>,
) -> Result<Vec<OrderWithLines>, sqlx::Error> {
    if orders.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let lines = sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_lines ol
         JOIN medicines m ON m.id = ol.medicine_id
         WHERE ol.order_id = ANY($1)",
    ))
    .bind(&ids)
    .fetch_all(pool)
    .await?;
    let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for line in lines {
        by_order.entry(line.order_id).or_default().push(line);
    }
    Ok(orders
        .into_iter()
        .map(|order| OrderWithLines {
            lines: by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}
