//! Error taxonomy and HTTP mapping.
//!
//! Business-rule violations surface as 400 with a human-readable message,
//! visibility misses as 404 (whether the resource is absent or merely not
//! visible to the actor), and infrastructure failures as an opaque 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::order::OrderError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Authentication required")]
    Unauthorized,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Order(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, (*msg).to_string()),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            ApiError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_map_to_400() {
        let resp = ApiError::Order(OrderError::EmptyCart).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_hides_existence() {
        let resp = ApiError::NotFound("Order").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
