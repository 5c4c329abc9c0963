//! HTTP surface: router wiring and request handlers.

use axum::routing::{get, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod cart;
pub mod orders;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "medimart"})) }),
        )
        .route(
            "/api/cart",
            get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart),
        )
        .route(
            "/api/cart/:id",
            put(cart::update_line).delete(cart::remove_line),
        )
        .route("/api/orders", get(orders::list_own).post(orders::create))
        .route("/api/orders/all", get(orders::list_all))
        .route("/api/orders/seller", get(orders::list_seller))
        .route("/api/orders/:id", get(orders::detail))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/orders/:id/payment", put(orders::update_payment))
        .route("/api/orders/:id/cancel", put(orders::cancel))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
