//! Cart endpoints (customer only).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthUser, Role};
use crate::domain::cart::CartLine;
use crate::error::{ApiError, ApiResult};
use crate::store::cart::{self, CartSummary};

use super::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub medicine_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

pub async fn get_cart(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<CartSummary>> {
    let auth = auth.require(Role::Customer)?;
    let mut conn = state.db.acquire().await?;
    let snapshot = cart::snapshot(&mut conn, auth.user_id).await?;
    Ok(Json(snapshot.into()))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<CartLine>)> {
    let auth = auth.require(Role::Customer)?;
    req.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let line = cart::add_line(&state.db, auth.user_id, req.medicine_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn update_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(line_id): Path<Uuid>,
    Json(req): Json<UpdateCartRequest>,
) -> ApiResult<Json<CartLine>> {
    let auth = auth.require(Role::Customer)?;
    req.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let line = cart::update_line(&state.db, auth.user_id, line_id, req.quantity).await?;
    Ok(Json(line))
}

pub async fn remove_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(line_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let auth = auth.require(Role::Customer)?;
    cart::remove_line(&state.db, auth.user_id, line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cart(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    let auth = auth.require(Role::Customer)?;
    let mut conn = state.db.acquire().await?;
    cart::clear(&mut conn, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
