//! Order endpoints: checkout, listings, detail, status/payment updates and
//! customer cancellation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthUser, Role};
use crate::domain::order::{Order, ShippingInfo, DEFAULT_COUNTRY};
use crate::domain::status::{OrderStatus, PaymentStatus};
use crate::error::{ApiError, ApiResult};
use crate::service;
use crate::store::orders::{self, OrderWithLines, Paginated};

use super::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Shipping address is required"))]
    pub shipping_address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, message = "Zip code is required"))]
    pub zip_code: String,
    pub country: Option<String>,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    fn into_shipping(self) -> ShippingInfo {
        ShippingInfo {
            shipping_address: self.shipping_address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            country: self
                .country
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            phone: self.phone,
            payment_method: self.payment_method,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

impl ListQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, 100)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderWithLines>)> {
    let auth = auth.require(Role::Customer)?;
    req.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let order = service::checkout::checkout(&state.db, auth.user_id, req.into_shipping()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_own(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Paginated<OrderWithLines>>> {
    let auth = auth.require(Role::Customer)?;
    let page = orders::list_for_user(&state.db, auth.user_id, query.page(), query.limit(10)).await?;
    Ok(Json(page))
}

pub async fn list_all(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Paginated<OrderWithLines>>> {
    auth.require(Role::Admin)?;
    let page = orders::list_all(&state.db, query.page(), query.limit(20), query.status).await?;
    Ok(Json(page))
}

pub async fn list_seller(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Paginated<OrderWithLines>>> {
    let auth = auth.require(Role::Seller)?;
    let page = orders::list_for_seller(
        &state.db,
        auth.user_id,
        query.page(),
        query.limit(20),
        query.status,
    )
    .await?;
    Ok(Json(page))
}

pub async fn detail(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderWithLines>> {
    let order = orders::fetch_visible(&state.db, order_id, auth)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    Ok(Json(order))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<OrderWithLines>> {
    let auth = auth.require_any(&[Role::Admin, Role::Seller])?;
    let order =
        service::orders::update_status(&state.db, order_id, auth, req.status, req.tracking_number)
            .await?;
    Ok(Json(order))
}

pub async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdatePaymentRequest>,
) -> ApiResult<Json<Order>> {
    auth.require(Role::Admin)?;
    let order = service::orders::update_payment(&state.db, order_id, req.payment_status).await?;
    Ok(Json(order))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderWithLines>> {
    let auth = auth.require(Role::Customer)?;
    let order = service::orders::cancel(&state.db, order_id, auth.user_id).await?;
    Ok(Json(order))
}
