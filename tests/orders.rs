//! End-to-end order flow tests against a real Postgres, one fresh database
//! per test via `#[sqlx::test]` (migrations applied automatically).

use medimart::domain::order::{OrderError, ShippingInfo, DEFAULT_COUNTRY};
use medimart::domain::status::OrderStatus;
use medimart::error::ApiError;
use medimart::service;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

fn shipping() -> ShippingInfo {
    ShippingInfo {
        shipping_address: "12 Lake Road".into(),
        city: "Dhaka".into(),
        state: None,
        zip_code: "1207".into(),
        country: DEFAULT_COUNTRY.into(),
        phone: "+8801700000000".into(),
        payment_method: "COD".into(),
        notes: None,
    }
}

async fn seed_medicine(pool: &PgPool, name: &str, price: Decimal, stock: i32) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO medicines (id, seller_id, name, slug, price, stock_quantity)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(format!("{}-{id}", name.to_lowercase()))
    .bind(price)
    .bind(stock)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn add_to_cart(pool: &PgPool, user_id: Uuid, medicine_id: Uuid, quantity: i32) {
    sqlx::query("INSERT INTO cart_lines (id, user_id, medicine_id, quantity) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(medicine_id)
        .bind(quantity)
        .execute(pool)
        .await
        .unwrap();
}

async fn stock_of(pool: &PgPool, medicine_id: Uuid) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock_quantity FROM medicines WHERE id = $1")
        .bind(medicine_id)
        .fetch_one(pool)
        .await
        .unwrap();
    stock
}

async fn count(pool: &PgPool, sql: &str, user_id: Uuid) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).bind(user_id).fetch_one(pool).await.unwrap();
    n
}

#[sqlx::test]
async fn checkout_reserves_and_cancel_restores_stock(pool: PgPool) {
    let user = Uuid::new_v4();
    let napa = seed_medicine(&pool, "Napa", dec!(100), 10).await;
    let seclo = seed_medicine(&pool, "Seclo", dec!(50), 5).await;
    add_to_cart(&pool, user, napa, 3).await;
    add_to_cart(&pool, user, seclo, 2).await;

    let placed = service::checkout::checkout(&pool, user, shipping())
        .await
        .unwrap();
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(stock_of(&pool, napa).await, 7);
    assert_eq!(stock_of(&pool, seclo).await, 3);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM cart_lines WHERE user_id = $1", user).await,
        0
    );

    let cancelled = service::orders::cancel(&pool, placed.order.id, user)
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert!(cancelled.order.cancelled_at.is_some());
    // Every line's quantity is back: stock returns to its pre-checkout value
    // exactly.
    assert_eq!(stock_of(&pool, napa).await, 10);
    assert_eq!(stock_of(&pool, seclo).await, 5);
}

#[sqlx::test]
async fn checkout_shortfall_leaves_no_trace(pool: PgPool) {
    let user = Uuid::new_v4();
    let napa = seed_medicine(&pool, "Napa", dec!(10), 3).await;
    add_to_cart(&pool, user, napa, 5).await;

    let err = service::checkout::checkout(&pool, user, shipping())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Order(OrderError::InsufficientStock { ref name }) if name == "Napa"
    ));
    // No order row, stock untouched, cart still intact.
    assert_eq!(stock_of(&pool, napa).await, 3);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM orders WHERE user_id = $1", user).await,
        0
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM cart_lines WHERE user_id = $1", user).await,
        1
    );
}

#[sqlx::test]
async fn concurrent_checkouts_cannot_oversell_last_unit(pool: PgPool) {
    let napa = seed_medicine(&pool, "Napa", dec!(100), 1).await;
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    add_to_cart(&pool, first, napa, 1).await;
    add_to_cart(&pool, second, napa, 1).await;

    let (r1, r2) = tokio::join!(
        service::checkout::checkout(&pool, first, shipping()),
        service::checkout::checkout(&pool, second, shipping()),
    );

    // Exactly one of the two racing checkouts wins the unit.
    assert!(r1.is_ok() != r2.is_ok(), "expected exactly one winner");
    let loser = if r1.is_err() {
        r1.unwrap_err()
    } else {
        r2.unwrap_err()
    };
    assert!(matches!(
        loser,
        ApiError::Order(OrderError::InsufficientStock { .. })
    ));
    assert_eq!(stock_of(&pool, napa).await, 0);

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 1);
}

#[sqlx::test]
async fn staff_cancellation_restores_stock_in_same_transaction(pool: PgPool) {
    use medimart::auth::{AuthUser, Role};

    let user = Uuid::new_v4();
    let napa = seed_medicine(&pool, "Napa", dec!(100), 4).await;
    add_to_cart(&pool, user, napa, 4).await;
    let placed = service::checkout::checkout(&pool, user, shipping())
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, napa).await, 0);

    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let updated = service::orders::update_status(
        &pool,
        placed.order.id,
        admin,
        OrderStatus::Cancelled,
        None,
    )
    .await
    .unwrap();
    assert_eq!(updated.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&pool, napa).await, 4);
}
