//! Verified request identity.
//!
//! Authentication itself happens upstream; this service trusts the
//! `x-user-id` / `x-user-role` headers the gateway attaches after verifying
//! the session. Requests without both headers are rejected with 401.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Some(Role::Customer),
            "SELLER" => Some(Role::Seller),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The verified `{userId, role}` pair every handler receives.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require(self, role: Role) -> Result<Self, ApiError> {
        self.require_any(&[role])
    }

    pub fn require_any(self, roles: &[Role]) -> Result<Self, ApiError> {
        if roles.contains(&self.role) {
            Ok(self)
        } else {
            Err(ApiError::Forbidden(
                "You do not have permission to perform this action",
            ))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let user_id = header("x-user-id")
            .and_then(|v| Uuid::parse_str(&v).ok())
            .ok_or(ApiError::Unauthorized)?;
        let role = header("x-user-role")
            .as_deref()
            .and_then(Role::parse)
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthUser { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("CUSTOMER"), Some(Role::Customer));
        assert_eq!(Role::parse("seller"), Some(Role::Seller));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_require_any() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Seller,
        };
        assert!(user.require_any(&[Role::Admin, Role::Seller]).is_ok());
        assert!(user.require(Role::Customer).is_err());
    }
}
